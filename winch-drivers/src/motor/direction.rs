//! Direction line
//!
//! The driver board reads one logic level for rotation. Which level means
//! clockwise depends on how the motor leads are wired, so it is
//! configurable; the stock wiring is LOW = clockwise.

use embedded_hal::digital::OutputPin;
use winch_core::traits::{Direction, DirectionOutput};

/// Pin level that selects clockwise rotation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DirectionLevel {
    /// LOW = clockwise
    #[default]
    LowIsClockwise,
    /// HIGH = clockwise
    HighIsClockwise,
}

/// Direction output over an embedded-hal output pin
pub struct DirectionPin<P> {
    pin: P,
    level: DirectionLevel,
    /// Writes the pin rejected
    write_errors: u32,
}

impl<P: OutputPin> DirectionPin<P> {
    /// Create a direction output
    pub fn new(pin: P, level: DirectionLevel) -> Self {
        Self {
            pin,
            level,
            write_errors: 0,
        }
    }

    /// Create a direction output with the stock wiring
    pub fn low_is_clockwise(pin: P) -> Self {
        Self::new(pin, DirectionLevel::LowIsClockwise)
    }

    /// Wiring in use
    pub fn level(&self) -> DirectionLevel {
        self.level
    }

    /// Number of rejected writes
    pub fn write_errors(&self) -> u32 {
        self.write_errors
    }
}

impl<P: OutputPin> DirectionOutput for DirectionPin<P> {
    fn set_direction(&mut self, dir: Direction) {
        let high = match self.level {
            DirectionLevel::LowIsClockwise => !dir.is_cw(),
            DirectionLevel::HighIsClockwise => dir.is_cw(),
        };
        let result = if high {
            self.pin.set_high()
        } else {
            self.pin.set_low()
        };
        if result.is_err() {
            self.write_errors = self.write_errors.saturating_add(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;
    use embedded_hal::digital::{ErrorKind, ErrorType};

    /// Mock GPIO pin for testing
    struct MockPin {
        high: Option<bool>,
    }

    impl ErrorType for MockPin {
        type Error = Infallible;
    }

    impl OutputPin for MockPin {
        fn set_low(&mut self) -> Result<(), Self::Error> {
            self.high = Some(false);
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Self::Error> {
            self.high = Some(true);
            Ok(())
        }
    }

    #[test]
    fn test_stock_wiring() {
        let mut dir = DirectionPin::low_is_clockwise(MockPin { high: None });
        assert_eq!(dir.level(), DirectionLevel::LowIsClockwise);

        dir.set_direction(Direction::Clockwise);
        assert_eq!(dir.pin.high, Some(false));

        dir.set_direction(Direction::CounterClockwise);
        assert_eq!(dir.pin.high, Some(true));
    }

    #[test]
    fn test_inverted_wiring() {
        let mut dir = DirectionPin::new(MockPin { high: None }, DirectionLevel::HighIsClockwise);

        dir.set_direction(Direction::Clockwise);
        assert_eq!(dir.pin.high, Some(true));

        dir.set_direction(Direction::CounterClockwise);
        assert_eq!(dir.pin.high, Some(false));
    }

    /// Pin that rejects every write
    struct BrokenPin;

    impl ErrorType for BrokenPin {
        type Error = ErrorKind;
    }

    impl OutputPin for BrokenPin {
        fn set_low(&mut self) -> Result<(), Self::Error> {
            Err(ErrorKind::Other)
        }

        fn set_high(&mut self) -> Result<(), Self::Error> {
            Err(ErrorKind::Other)
        }
    }

    #[test]
    fn test_rejected_writes_are_counted() {
        let mut dir = DirectionPin::low_is_clockwise(BrokenPin);
        assert_eq!(dir.write_errors(), 0);

        dir.set_direction(Direction::Clockwise);
        dir.set_direction(Direction::CounterClockwise);
        assert_eq!(dir.write_errors(), 2);
    }
}
