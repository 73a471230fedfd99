use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::{
    cli::RunOptions,
    config::{loader::font_dir_for, Config, ConfigOrigin, LoadedConfig},
    display::{panel, FontSet, MemoryPanel, Panel},
    metrics::{network::local_hostname, Sources},
    Result,
};

mod lifecycle;
mod logger;
mod render_loop;
mod rotation;

pub use lifecycle::{ShutdownSignal, MANUAL_SHUTDOWN};
pub use logger::{LogLevel, Logger};
pub use render_loop::{RenderCycle, TickStats};
pub use rotation::NetworkRotation;

pub struct App {
    config: Config,
    config_path: PathBuf,
    font_dir: PathBuf,
    options: RunOptions,
    logger: Logger,
}

impl App {
    /// Resolve the config path, load and merge the config, and set up logging.
    pub fn from_options(opts: RunOptions) -> Result<Self> {
        let level = match opts.log_level.as_deref() {
            Some(raw) => LogLevel::from_str(raw)?,
            None => LogLevel::default(),
        };
        let mut logger = Logger::new(level, opts.log_file.clone());
        if opts.syslog {
            if let Err(err) = logger.enable_syslog() {
                logger.warn(format!("syslog unavailable: {err}"));
            }
        }

        let config_path = match opts.config.as_deref() {
            Some(path) => PathBuf::from(path),
            None => Config::default_path()?,
        };
        let loaded = Config::load(&config_path)?;
        report_config(&logger, &config_path, &loaded);

        Ok(Self {
            config: loaded.config,
            font_dir: font_dir_for(&config_path),
            config_path,
            options: opts,
            logger,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn font_dir(&self) -> &Path {
        &self.font_dir
    }

    /// Entry point for the daemon. Returns once a shutdown signal was handled.
    pub fn run(&self) -> Result<()> {
        let display = &self.config.display;
        self.logger.info(format!(
            "pixelstat {} starting on {} (display {}x{}, flipped={})",
            env!("CARGO_PKG_VERSION"),
            os_info::get(),
            display.width,
            display.height,
            display.flipped()
        ));

        if self.options.clear {
            let mut panel = self.open_panel()?;
            panel.clear()?;
            self.logger.info("display cleared");
            return Ok(());
        }

        let fonts = self.load_fonts()?;
        let shutdown = ShutdownSignal::install()?;
        let panel = self.open_panel()?;
        let hostname = local_hostname();
        self.logger.info(format!("hostname: {hostname}"));

        let mut cycle = RenderCycle::new(&self.config, fonts, Sources::system(), hostname, panel)
            .with_frame_log(self.options.dry_run);
        cycle.run(&shutdown, &self.logger);
        Ok(())
    }

    /// Text font failure is fatal; icon font failure drops to text-only mode.
    pub fn load_fonts(&self) -> Result<FontSet> {
        let cfg = &self.config.fonts;
        let mut fonts = FontSet::load_text(cfg, &self.font_dir)?;
        match fonts.load_icons(cfg, &self.font_dir) {
            Ok(()) => self.logger.info(format!("icon font loaded ({})", cfg.icon_font)),
            Err(err) => self
                .logger
                .info(format!("icons disabled, rendering text only: {err}")),
        }
        Ok(fonts)
    }

    fn open_panel(&self) -> Result<Box<dyn Panel>> {
        if self.options.dry_run {
            self.logger.info("dry run: rendering to memory");
            return Ok(Box::new(MemoryPanel::new()));
        }
        panel::open(&self.config.display, &self.logger)
    }
}

fn report_config(logger: &Logger, path: &Path, loaded: &LoadedConfig) {
    match &loaded.origin {
        ConfigOrigin::File => logger.info(format!("config loaded from {}", path.display())),
        ConfigOrigin::Missing => logger.info(format!(
            "no config at {}, using defaults",
            path.display()
        )),
        ConfigOrigin::Unparseable(reason) => logger.warn(format!(
            "config at {} unreadable ({reason}), using defaults",
            path.display()
        )),
    }
    for (section, reason) in &loaded.fallbacks {
        logger.warn(format!(
            "config section '{section}' rejected ({reason}), using its defaults"
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use std::fs;
    use tempfile::tempdir;

    fn options_for(path: &Path) -> RunOptions {
        RunOptions {
            config: Some(path.display().to_string()),
            log_level: Some("error".into()),
            dry_run: true,
            ..RunOptions::default()
        }
    }

    #[test]
    fn fonts_resolve_next_to_the_config_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"timing": {"refresh_interval": 0.5}}"#).unwrap();

        let app = App::from_options(options_for(&path)).unwrap();
        assert_eq!(app.font_dir(), dir.path().join("Fonts"));
        assert_eq!(app.config().timing.refresh_interval, 0.5);
        assert_eq!(app.config().timing.rotation_interval, 3);
    }

    #[test]
    fn missing_text_font_is_fatal() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let app = App::from_options(options_for(&path)).unwrap();
        assert!(matches!(app.load_fonts(), Err(Error::Font(_))));
        assert!(matches!(app.run(), Err(Error::Font(_))));
    }

    #[test]
    fn builtin_text_font_runs_without_icons() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"fonts": {"text_font": "builtin"}}"#).unwrap();
        let app = App::from_options(options_for(&path)).unwrap();
        let fonts = app.load_fonts().unwrap();
        assert!(!fonts.icons_loaded());
    }

    #[test]
    fn clear_on_dry_run_exits_cleanly() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let mut opts = options_for(&path);
        opts.clear = true;
        let app = App::from_options(opts).unwrap();
        app.run().unwrap();
    }

    #[test]
    fn rejects_unknown_log_level() {
        let opts = RunOptions {
            log_level: Some("loud".into()),
            ..RunOptions::default()
        };
        assert!(matches!(App::from_options(opts), Err(Error::InvalidArgs(_))));
    }
}
