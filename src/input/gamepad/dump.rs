//! Human-readable dumps of a slot's current control state

use std::fmt::{self, Write};

use super::types::{AnalogChannel, Button, Controls, StreamType};

/// Prefix written at the start of every dump line
pub const DUMP_PREFIX: &str = "GamepadTracker";

const ANALOG_WIDTH: usize = 11;
const DIGITAL_WIDTH: usize = 14;

/// Append the selected sections of `controls` to `out`
pub fn write_controls<W: Write>(out: &mut W, controls: &Controls, filter: StreamType) -> fmt::Result {
    if filter.includes_analog() {
        writeln!(out, "{}: --------ANALOG----------", DUMP_PREFIX)?;
        for channel in AnalogChannel::ALL {
            writeln!(
                out,
                "{}: {:<width$} = {}",
                DUMP_PREFIX,
                channel.label(),
                controls.analog[channel],
                width = ANALOG_WIDTH
            )?;
        }
    }

    if filter.includes_digital() {
        writeln!(out, "{}: --------DIGITAL----------", DUMP_PREFIX)?;
        for button in Button::ALL {
            writeln!(
                out,
                "{}: {:<width$} = {}",
                DUMP_PREFIX,
                button.label(),
                if controls.digital[button] { "TRUE" } else { "FALSE" },
                width = DIGITAL_WIDTH
            )?;
        }
    }

    writeln!(out)
}
