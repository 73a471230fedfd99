use crate::{Error, Result};

/// Options for the `run` command; values are `None`/`false` when not provided on CLI.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RunOptions {
    pub config: Option<String>,
    pub log_level: Option<String>,
    pub log_file: Option<String>,
    pub syslog: bool,
    pub dry_run: bool,
    pub clear: bool,
}

/// Parsed command-line intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Run(RunOptions),
    ShowHelp,
    ShowVersion,
}

impl Command {
    pub fn parse(args: &[String]) -> Result<Self> {
        let mut iter = args.iter();
        match iter.next().map(|s| s.as_str()) {
            None => Ok(Command::Run(RunOptions::default())),
            Some("run") => Ok(Command::Run(parse_run_options(&mut iter)?)),
            Some("--help") | Some("-h") => Ok(Command::ShowHelp),
            Some("--version") | Some("-V") => Ok(Command::ShowVersion),
            Some(flag) if flag.starts_with('-') => {
                // `run` is implied when the first argument is already a flag.
                Ok(Command::Run(parse_run_options(&mut args.iter())?))
            }
            Some(cmd) => Err(Error::InvalidArgs(format!(
                "unknown command '{cmd}', try --help"
            ))),
        }
    }

    pub fn help() -> &'static str {
        concat!(
            "pixelstat - system status on an SSD1306 OLED\n",
            "\n",
            "USAGE:\n",
            "  pixelstat [run] [--config <path>] [--log-level <level>] [--log-file <path>] [--syslog] [--dry-run] [--clear]\n",
            "  pixelstat --help\n",
            "  pixelstat --version\n",
            "\n",
            "OPTIONS:\n",
            "  --config <path>      Config file (default: ~/.config/pixelstat/config.json)\n",
            "  --log-level <level>  error|warn|info|debug|trace (default: info)\n",
            "  --log-file <path>    Append log lines to a file\n",
            "  --syslog             Also log to the local syslog daemon\n",
            "  --dry-run            Render to memory instead of the I2C panel\n",
            "  --clear              Blank the panel and exit\n",
            "  -h, --help           Show this help\n",
            "  -V, --version        Show version\n",
        )
    }

    pub fn print_help() {
        println!("{}", Self::help());
    }
}

fn parse_run_options(iter: &mut std::slice::Iter<String>) -> Result<RunOptions> {
    let mut opts = RunOptions::default();

    while let Some(flag) = iter.next() {
        match flag.as_str() {
            "--config" => opts.config = Some(take_value(flag, iter)?),
            "--log-level" => opts.log_level = Some(take_value(flag, iter)?),
            "--log-file" => opts.log_file = Some(take_value(flag, iter)?),
            "--syslog" => opts.syslog = true,
            "--dry-run" => opts.dry_run = true,
            "--clear" => opts.clear = true,
            other => {
                return Err(Error::InvalidArgs(format!(
                    "unknown flag '{other}', try --help"
                )));
            }
        }
    }

    Ok(opts)
}

fn take_value(flag: &str, iter: &mut std::slice::Iter<String>) -> Result<String> {
    iter.next()
        .cloned()
        .ok_or_else(|| Error::InvalidArgs(format!("expected a value after {flag}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parse_defaults_with_no_args() {
        let cmd = Command::parse(&[]).unwrap();
        assert_eq!(cmd, Command::Run(RunOptions::default()));
    }

    #[test]
    fn parse_run_with_overrides() {
        let cmd = Command::parse(&args(&[
            "run",
            "--config",
            "/etc/pixelstat/config.json",
            "--log-level",
            "debug",
            "--log-file",
            "/tmp/pixelstat.log",
            "--syslog",
            "--dry-run",
        ]))
        .unwrap();
        let expected = RunOptions {
            config: Some("/etc/pixelstat/config.json".into()),
            log_level: Some("debug".into()),
            log_file: Some("/tmp/pixelstat.log".into()),
            syslog: true,
            dry_run: true,
            clear: false,
        };
        assert_eq!(cmd, Command::Run(expected));
    }

    #[test]
    fn parse_run_allows_implicit_subcommand() {
        let cmd = Command::parse(&args(&["--clear", "--config", "cfg.json"])).unwrap();
        let expected = RunOptions {
            config: Some("cfg.json".into()),
            clear: true,
            ..RunOptions::default()
        };
        assert_eq!(cmd, Command::Run(expected));
    }

    #[test]
    fn parse_help_and_version() {
        assert_eq!(Command::parse(&args(&["-h"])).unwrap(), Command::ShowHelp);
        assert_eq!(
            Command::parse(&args(&["--version"])).unwrap(),
            Command::ShowVersion
        );
    }

    #[test]
    fn parse_rejects_unknown_flag_and_missing_value() {
        let err = Command::parse(&args(&["--nope"])).unwrap_err();
        assert!(format!("{err}").contains("unknown flag"));
        let err = Command::parse(&args(&["run", "--config"])).unwrap_err();
        assert!(format!("{err}").contains("expected a value after --config"));
        let err = Command::parse(&args(&["serve"])).unwrap_err();
        assert!(format!("{err}").contains("unknown command"));
    }
}
