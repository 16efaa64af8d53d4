use bw_core::EngineError;
use bw_core::EngineResult;
use std::path::PathBuf;

pub(crate) const USAGE: &str =
    "usage: boxwood <file|http-url> [--out view.png] [--width N] [--height N] [--post key=value]...";

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CliOptions {
    pub(crate) source: String,
    pub(crate) out: PathBuf,
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) form: Vec<(String, String)>,
}

impl CliOptions {
    pub(crate) fn from_args(args: impl IntoIterator<Item = String>) -> EngineResult<Self> {
        let mut source = None;
        let mut out = PathBuf::from("view.png");
        let mut width = 800;
        let mut height = 800;
        let mut form = Vec::new();

        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--out" => out = PathBuf::from(value_after(&mut args, "--out")?),
                "--width" => width = dimension(&value_after(&mut args, "--width")?)?,
                "--height" => height = dimension(&value_after(&mut args, "--height")?)?,
                "--post" => {
                    let pair = value_after(&mut args, "--post")?;
                    let Some((key, value)) = pair.split_once('=') else {
                        return Err(EngineError::new(
                            "app.args.invalid_field",
                            format!("form field `{pair}` must look like key=value"),
                        ));
                    };
                    form.push((key.to_owned(), value.to_owned()));
                }
                flag if flag.starts_with("--") => {
                    return Err(EngineError::new(
                        "app.args.unknown_flag",
                        format!("unknown flag `{flag}`\n{USAGE}"),
                    ));
                }
                _ if source.is_some() => {
                    return Err(EngineError::new(
                        "app.args.extra_source",
                        format!("unexpected argument `{arg}`\n{USAGE}"),
                    ));
                }
                _ => source = Some(arg),
            }
        }

        let Some(source) = source else {
            return Err(EngineError::new("app.args.missing_source", USAGE));
        };

        Ok(Self {
            source,
            out,
            width,
            height,
            form,
        })
    }

    pub(crate) fn is_remote(&self) -> bool {
        self.source.starts_with("http://") || self.source.starts_with("https://")
    }
}

fn value_after(args: &mut impl Iterator<Item = String>, flag: &str) -> EngineResult<String> {
    args.next().ok_or_else(|| {
        EngineError::new("app.args.missing_value", format!("missing value after {flag}"))
    })
}

fn dimension(value: &str) -> EngineResult<u32> {
    match value.parse::<u32>() {
        Ok(parsed) if parsed > 0 => Ok(parsed),
        _ => Err(EngineError::new(
            "app.args.invalid_dimension",
            format!("`{value}` is not a positive pixel count"),
        )),
    }
}
