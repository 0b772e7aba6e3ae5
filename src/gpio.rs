/// Production pin bank over the Raspberry Pi GPIO peripheral.
///
/// Uses BCM pin numbering throughout, matching the wiring of the Sleepy Pi
/// expansion header. Acquiring the peripheral or a pin fails hard; there is
/// nothing useful this daemon can do without its two pins.
use crate::pins::{PinController, PinError};
use rppal::gpio::{Gpio, InputPin, OutputPin};
use std::collections::HashMap;

pub struct RppalPinBank {
    gpio: Gpio,
    inputs: HashMap<u8, InputPin>,
    outputs: HashMap<u8, OutputPin>,
}

impl RppalPinBank {
    /// Open the GPIO peripheral. Requires access to /dev/gpiomem or /dev/mem.
    pub fn new() -> Result<Self, PinError> {
        let gpio = Gpio::new().map_err(|e| PinError::Hardware {
            message: e.to_string(),
        })?;
        Ok(Self {
            gpio,
            inputs: HashMap::new(),
            outputs: HashMap::new(),
        })
    }
}

impl PinController for RppalPinBank {
    fn configure_input(&mut self, pin: u8) -> Result<(), PinError> {
        let input = self
            .gpio
            .get(pin)
            .map_err(|e| PinError::Hardware {
                message: format!("pin {}: {}", pin, e),
            })?
            .into_input();
        self.inputs.insert(pin, input);
        Ok(())
    }

    fn configure_output(&mut self, pin: u8) -> Result<(), PinError> {
        let output = self
            .gpio
            .get(pin)
            .map_err(|e| PinError::Hardware {
                message: format!("pin {}: {}", pin, e),
            })?
            .into_output();
        self.outputs.insert(pin, output);
        Ok(())
    }

    fn read(&mut self, pin: u8) -> Result<bool, PinError> {
        let input = self
            .inputs
            .get(&pin)
            .ok_or(PinError::NotConfigured { pin })?;
        Ok(input.is_high())
    }

    fn write(&mut self, pin: u8, level: bool) -> Result<(), PinError> {
        let output = self
            .outputs
            .get_mut(&pin)
            .ok_or(PinError::NotConfigured { pin })?;
        if level {
            output.set_high();
        } else {
            output.set_low();
        }
        Ok(())
    }
}
