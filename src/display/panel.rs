//! Device layer: pushes a finished [`Canvas`] to the physical panel.

use embedded_hal::{delay::DelayNs, digital::OutputPin};

use super::canvas::Canvas;
use crate::{Error, Result};

/// Reset line low time, then settle time before init.
const RESET_LOW_MS: u32 = 100;
const RESET_SETTLE_MS: u32 = 100;

/// A monochrome panel that shows whole frames.
pub trait Panel {
    /// Blank the panel.
    fn clear(&mut self) -> Result<()>;

    /// Show `canvas`. A successful return means the frame is on the glass.
    fn commit(&mut self, canvas: &Canvas) -> Result<()>;
}

impl<P: Panel + ?Sized> Panel for Box<P> {
    fn clear(&mut self) -> Result<()> {
        (**self).clear()
    }

    fn commit(&mut self, canvas: &Canvas) -> Result<()> {
        (**self).commit(canvas)
    }
}

/// Drive the reset line high, low, high. Panels wired without a reset line skip this.
/// The line comes back still driven high; the caller holds it while the panel is in use.
pub fn pulse_reset<P, D>(mut pin: P, delay: &mut D) -> Result<P>
where
    P: OutputPin,
    D: DelayNs,
{
    let map = |err: P::Error| Error::Display(format!("reset line: {err:?}"));
    pin.set_high().map_err(map)?;
    delay.delay_ms(1);
    pin.set_low().map_err(map)?;
    delay.delay_ms(RESET_LOW_MS);
    pin.set_high().map_err(map)?;
    delay.delay_ms(RESET_SETTLE_MS);
    Ok(pin)
}

/// In-memory panel for dry runs and tests. Records what was shown and can be
/// told to fail.
#[derive(Debug, Default)]
pub struct MemoryPanel {
    commits: usize,
    clears: usize,
    last: Option<Canvas>,
    failing_commits: usize,
}

impl MemoryPanel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `count` commits fail.
    pub fn fail_next_commits(&mut self, count: usize) {
        self.failing_commits = count;
    }

    pub fn commits(&self) -> usize {
        self.commits
    }

    pub fn clears(&self) -> usize {
        self.clears
    }

    /// Last successfully committed frame.
    pub fn last(&self) -> Option<&Canvas> {
        self.last.as_ref()
    }
}

impl Panel for MemoryPanel {
    fn clear(&mut self) -> Result<()> {
        self.clears += 1;
        if let Some(last) = self.last.as_mut() {
            last.clear();
        }
        Ok(())
    }

    fn commit(&mut self, canvas: &Canvas) -> Result<()> {
        if self.failing_commits > 0 {
            self.failing_commits -= 1;
            return Err(Error::Display("injected commit failure".into()));
        }
        self.commits += 1;
        self.last = Some(canvas.clone());
        Ok(())
    }
}

#[cfg(target_os = "linux")]
mod ssd1306_panel {
    use linux_embedded_hal::{Delay, I2cdev};
    use rppal::gpio::OutputPin as ResetLine;
    use ssd1306::{
        mode::{BufferedGraphicsMode, DisplayConfig as _},
        prelude::I2CInterface,
        rotation::DisplayRotation,
        size::{
            DisplaySize, DisplaySize128x32, DisplaySize128x64, DisplaySize64x48,
            DisplaySize72x40, DisplaySize96x16,
        },
        I2CDisplayInterface, Ssd1306,
    };

    use super::{pulse_reset, Canvas, Panel};
    use crate::{app::Logger, config::DisplayConfig, Error, Result};

    fn map_display_err(context: &str, err: impl std::fmt::Debug) -> Error {
        Error::Display(format!("{context}: {err:?}"))
    }

    /// SSD1306 over Linux I2C in buffered graphics mode.
    pub struct Ssd1306Panel<S: DisplaySize> {
        display: Ssd1306<I2CInterface<I2cdev>, S, BufferedGraphicsMode<S>>,
        /// Held high for as long as the panel is open.
        _reset: Option<ResetLine>,
    }

    impl<S: DisplaySize> Ssd1306Panel<S> {
        fn init(cfg: &DisplayConfig, size: S, reset: Option<ResetLine>) -> Result<Self> {
            let i2c = I2cdev::new(&cfg.i2c_bus)
                .map_err(|err| Error::Display(format!("{}: {err}", cfg.i2c_bus)))?;
            let interface = I2CDisplayInterface::new_custom_address(i2c, cfg.i2c_address.0);
            let rotation = if cfg.flipped() {
                DisplayRotation::Rotate180
            } else {
                DisplayRotation::Rotate0
            };
            let mut display =
                Ssd1306::new(interface, size, rotation).into_buffered_graphics_mode();
            display
                .init()
                .map_err(|err| map_display_err("panel init", err))?;
            Ok(Self {
                display,
                _reset: reset,
            })
        }
    }

    impl<S: DisplaySize> Panel for Ssd1306Panel<S> {
        fn clear(&mut self) -> Result<()> {
            self.display.clear_buffer();
            self.display
                .flush()
                .map_err(|err| map_display_err("panel flush", err))
        }

        fn commit(&mut self, canvas: &Canvas) -> Result<()> {
            for (x, y, on) in canvas.iter() {
                self.display.set_pixel(x, y, on);
            }
            self.display
                .flush()
                .map_err(|err| map_display_err("panel flush", err))
        }
    }

    fn reset(pin: u8) -> Result<ResetLine> {
        let gpio = rppal::gpio::Gpio::new()
            .map_err(|err| Error::Display(format!("gpio: {err}")))?;
        let mut line = gpio
            .get(pin)
            .map_err(|err| Error::Display(format!("gpio {pin}: {err}")))?
            .into_output();
        // Dropping the pin must not release the line back to an input.
        line.set_reset_on_drop(false);
        pulse_reset(line, &mut Delay)
    }

    /// Pulse the reset line (when wired), open the bus and initialize the panel.
    /// A failed reset pulse is logged; the panel may still answer on the bus.
    pub fn open(cfg: &DisplayConfig, logger: &Logger) -> Result<Box<dyn Panel>> {
        let line = match cfg.reset_pin {
            Some(pin) => {
                logger.debug(format!("pulsing panel reset on gpio {pin}"));
                match reset(pin) {
                    Ok(line) => Some(line),
                    Err(err) => {
                        logger.warn(format!("panel reset skipped: {err}"));
                        None
                    }
                }
            }
            None => {
                logger.debug("panel reset line not configured");
                None
            }
        };

        let panel: Box<dyn Panel> = match (cfg.width, cfg.height) {
            (128, 64) => Box::new(Ssd1306Panel::init(cfg, DisplaySize128x64, line)?),
            (128, 32) => Box::new(Ssd1306Panel::init(cfg, DisplaySize128x32, line)?),
            (96, 16) => Box::new(Ssd1306Panel::init(cfg, DisplaySize96x16, line)?),
            (72, 40) => Box::new(Ssd1306Panel::init(cfg, DisplaySize72x40, line)?),
            (64, 48) => Box::new(Ssd1306Panel::init(cfg, DisplaySize64x48, line)?),
            (width, height) => {
                return Err(Error::InvalidArgs(format!(
                    "display geometry {width}x{height} is not supported"
                )))
            }
        };
        logger.info(format!(
            "panel ready ({}x{} at {:#04x} on {})",
            cfg.width, cfg.height, cfg.i2c_address.0, cfg.i2c_bus
        ));
        Ok(panel)
    }
}

#[cfg(target_os = "linux")]
pub use ssd1306_panel::open;

/// Non-Linux stub to satisfy builds on dev hosts; returns errors at runtime.
#[cfg(not(target_os = "linux"))]
pub fn open(
    _cfg: &crate::config::DisplayConfig,
    _logger: &crate::app::Logger,
) -> Result<Box<dyn Panel>> {
    Err(Error::InvalidArgs(
        "the SSD1306 panel is only available on Linux targets".into(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::convert::Infallible;
    use std::rc::Rc;

    #[derive(Default)]
    struct RecordingPin {
        levels: Vec<bool>,
    }

    impl embedded_hal::digital::ErrorType for RecordingPin {
        type Error = Infallible;
    }

    impl OutputPin for RecordingPin {
        fn set_low(&mut self) -> std::result::Result<(), Infallible> {
            self.levels.push(false);
            Ok(())
        }

        fn set_high(&mut self) -> std::result::Result<(), Infallible> {
            self.levels.push(true);
            Ok(())
        }
    }

    #[derive(Default)]
    struct CountingDelay {
        total_ns: u64,
    }

    impl DelayNs for CountingDelay {
        fn delay_ns(&mut self, ns: u32) {
            self.total_ns += ns as u64;
        }
    }

    #[test]
    fn reset_pulse_ends_high() {
        let mut delay = CountingDelay::default();
        let pin = pulse_reset(RecordingPin::default(), &mut delay).unwrap();
        assert_eq!(pin.levels, vec![true, false, true]);
        assert_eq!(
            delay.total_ns,
            (1 + RESET_LOW_MS + RESET_SETTLE_MS) as u64 * 1_000_000
        );
    }

    /// Flags when the line is let go, like a GPIO pin reverting on drop.
    struct ReleasingPin(Rc<Cell<bool>>);

    impl Drop for ReleasingPin {
        fn drop(&mut self) {
            self.0.set(true);
        }
    }

    impl embedded_hal::digital::ErrorType for ReleasingPin {
        type Error = Infallible;
    }

    impl OutputPin for ReleasingPin {
        fn set_low(&mut self) -> std::result::Result<(), Infallible> {
            Ok(())
        }

        fn set_high(&mut self) -> std::result::Result<(), Infallible> {
            Ok(())
        }
    }

    #[test]
    fn reset_line_stays_held_after_the_pulse() {
        let released = Rc::new(Cell::new(false));
        let held = pulse_reset(ReleasingPin(released.clone()), &mut CountingDelay::default())
            .unwrap();
        assert!(!released.get());
        drop(held);
        assert!(released.get());
    }

    #[test]
    fn memory_panel_records_commits() {
        let mut panel = MemoryPanel::new();
        let mut canvas = Canvas::new(8, 8);
        canvas.set(1, 1, true);
        panel.commit(&canvas).unwrap();
        assert_eq!(panel.commits(), 1);
        assert!(panel.last().unwrap().get(1, 1));

        panel.clear().unwrap();
        assert_eq!(panel.clears(), 1);
        assert!(panel.last().unwrap().is_blank());
    }

    #[test]
    fn injected_failures_do_not_replace_last_frame() {
        let mut panel = MemoryPanel::new();
        let mut first = Canvas::new(4, 4);
        first.set(0, 0, true);
        panel.commit(&first).unwrap();

        panel.fail_next_commits(2);
        let second = Canvas::new(4, 4);
        assert!(matches!(panel.commit(&second), Err(Error::Display(_))));
        assert!(panel.commit(&second).is_err());
        assert!(panel.last().unwrap().get(0, 0));

        panel.commit(&second).unwrap();
        assert_eq!(panel.commits(), 2);
        assert!(panel.last().unwrap().is_blank());
    }
}
