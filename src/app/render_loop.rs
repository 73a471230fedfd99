use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::time::Duration;

use super::lifecycle::{render_offline, ShutdownSignal};
use super::rotation::NetworkRotation;
use super::Logger;
use crate::{
    config::{Config, Thresholds},
    display::{
        layout::{compose_offline, compose_status, STATUS_LINES},
        Canvas, FontSet, Frame, IconSet, Layout, Levels, Panel,
    },
    metrics::Sources,
    Error, Result,
};

/// Running tallies of tick outcomes. Failures never stop the loop, so this is
/// where they stay visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TickStats {
    pub committed: u64,
    pub failed: u64,
    pub consecutive_failures: u64,
}

impl TickStats {
    fn record_success(&mut self) {
        self.committed += 1;
        self.consecutive_failures = 0;
    }

    fn record_failure(&mut self) {
        self.failed += 1;
        self.consecutive_failures += 1;
    }
}

/// Everything the render loop owns: built once at startup, then driven tick by tick.
pub struct RenderCycle<P: Panel> {
    layout: Layout,
    thresholds: Thresholds,
    icons: IconSet,
    fonts: FontSet,
    sources: Sources,
    hostname: String,
    canvas: Canvas,
    panel: P,
    rotation: NetworkRotation,
    refresh: Duration,
    stats: TickStats,
    last_frame: Option<Frame>,
    log_frames: bool,
}

impl<P: Panel> RenderCycle<P> {
    pub fn new(
        config: &Config,
        fonts: FontSet,
        sources: Sources,
        hostname: impl Into<String>,
        panel: P,
    ) -> Self {
        let icons = IconSet::new(
            config.icons.clone(),
            fonts.icons_loaded(),
            config.fonts.icon_advance(),
            config.fonts.icon_advance_large(),
        );
        Self {
            layout: Layout::new(config.display.height),
            thresholds: config.thresholds.clone(),
            icons,
            fonts,
            sources,
            hostname: hostname.into(),
            canvas: Canvas::new(config.display.width, config.display.height),
            panel,
            rotation: NetworkRotation::new(config.timing.rotation_interval),
            refresh: config.timing.refresh_duration(),
            stats: TickStats::default(),
            last_frame: None,
            log_frames: false,
        }
    }

    /// Log the text of every committed frame at debug level.
    pub fn with_frame_log(mut self, enabled: bool) -> Self {
        self.log_frames = enabled;
        self
    }

    pub fn panel(&self) -> &P {
        &self.panel
    }

    pub fn stats(&self) -> TickStats {
        self.stats
    }

    pub fn rotation(&self) -> &NetworkRotation {
        &self.rotation
    }

    /// Last frame the panel accepted.
    pub fn last_frame(&self) -> Option<&Frame> {
        self.last_frame.as_ref()
    }

    /// Tick until shutdown is requested, then show the offline screen.
    pub fn run(&mut self, shutdown: &ShutdownSignal, logger: &Logger) {
        logger.info(format!(
            "render loop start (refresh={}, rotation every {} ticks)",
            humantime::format_duration(self.refresh),
            self.rotation.interval()
        ));
        loop {
            self.step(logger);
            if let Some(signal) = shutdown.wait(self.refresh) {
                logger.info(format!("shutdown requested (signal {signal})"));
                break;
            }
        }
        self.finish(logger);
        logger.info(format!(
            "render loop stopped ({} committed, {} failed)",
            self.stats.committed, self.stats.failed
        ));
    }

    /// One guarded tick. Errors and panics are logged and counted, never propagated.
    pub fn step(&mut self, logger: &Logger) {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.tick(logger)));
        let err = match outcome {
            Ok(Ok(())) => {
                self.stats.record_success();
                logger.trace(format!("tick {} committed", self.stats.committed));
                return;
            }
            Ok(Err(err)) => err,
            Err(payload) => Error::Display(format!("tick panicked: {}", panic_message(payload.as_ref()))),
        };
        self.stats.record_failure();
        logger.warn(format!(
            "tick failed ({} total, {} in a row): {err}",
            self.stats.failed, self.stats.consecutive_failures
        ));
    }

    /// Show hostname and OFFLINE once. A failed commit is logged and ignored.
    pub fn finish(&mut self, logger: &Logger) {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            render_offline(
                &mut self.panel,
                &self.fonts,
                &self.icons,
                &mut self.canvas,
                &self.hostname,
            )
        }));
        match outcome {
            Ok(Ok(())) => {
                self.last_frame = Some(compose_offline(&self.icons, &self.hostname));
                logger.debug("offline screen committed");
            }
            Ok(Err(err)) => logger.warn(format!("offline screen not shown: {err}")),
            Err(payload) => logger.warn(format!(
                "offline screen panicked: {}",
                panic_message(payload.as_ref())
            )),
        }
    }

    fn tick(&mut self, logger: &Logger) -> Result<()> {
        self.canvas.clear();
        let snapshot = self.sources.collect(&self.hostname, logger);
        let fact = self.rotation.current(&snapshot.facts);
        let levels = Levels::classify(&snapshot, &self.thresholds);
        let frame = compose_status(&self.layout, &self.icons, &fact, &snapshot, &levels);
        self.fonts.draw_frame(&frame, &mut self.canvas);
        self.panel.commit(&self.canvas)?;
        self.rotation.tick(snapshot.facts.len());

        if self.log_frames && logger.enabled(super::LogLevel::Debug) {
            let lines: Vec<String> = (0..STATUS_LINES)
                .map(|line| frame.texts_at(self.layout.band(line)).join(" "))
                .collect();
            logger.debug(format!("frame: {}", lines.join(" | ")));
        }
        self.last_frame = Some(frame);
        Ok(())
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
