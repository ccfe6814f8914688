// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Step and gate mode tables.
//!
//! Both axes are closed enums with their metadata (duty cycle, played flag,
//! LED colors) exposed through lookup methods. A button press cycles a
//! step's mode to the next entry in table order.

use crate::control::Color;

/// Behavioral mode of one step slot.
///
/// `Reset` and `Stop` act on the sequence cursor: landing next to a `Reset`
/// sends the cursor back to the first played step, and a current `Stop`
/// freezes the cursor in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepMode {
    /// Played, advances normally
    Step,
    /// Not played, passed over transparently
    Skip,
    /// Not played; marks the logical end of the sequence
    Reset,
    /// Played; the cursor freezes here
    Stop,
}

impl StepMode {
    /// Table order for press cycling
    pub const ALL: [StepMode; 4] = [StepMode::Step, StepMode::Skip, StepMode::Reset, StepMode::Stop];

    /// Whether a step in this mode sounds when the cursor lands on it
    pub fn played(self) -> bool {
        match self {
            StepMode::Step | StepMode::Stop => true,
            StepMode::Skip | StepMode::Reset => false,
        }
    }

    /// Next mode in table order
    pub fn next(self) -> StepMode {
        match self {
            StepMode::Step => StepMode::Skip,
            StepMode::Skip => StepMode::Reset,
            StepMode::Reset => StepMode::Stop,
            StepMode::Stop => StepMode::Step,
        }
    }

    /// LED color while the cursor is on this step
    pub fn current_step_color(self) -> Color {
        match self {
            StepMode::Step => Color::GREEN_3,
            StepMode::Skip => Color::YELLOW_3,
            StepMode::Reset => Color::RED_3,
            StepMode::Stop => Color::GREEN_3,
        }
    }

    /// LED color for every other step
    pub fn other_step_color(self) -> Color {
        match self {
            StepMode::Step => Color::OFF,
            StepMode::Skip => Color::YELLOW_2,
            StepMode::Reset => Color::RED_2,
            StepMode::Stop => Color::GREEN_1,
        }
    }
}

impl Default for StepMode {
    fn default() -> Self {
        StepMode::Step
    }
}

/// Gate behavior of one step slot, independent of the step mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateMode {
    /// Gate open for most of the interval, closing before the next step
    Gate,
    /// Gate held across the step boundary until a later step closes it
    Tie,
    /// No gate, trigger, note or CV output for this step
    Silent,
}

impl GateMode {
    /// Table order for press cycling
    pub const ALL: [GateMode; 3] = [GateMode::Gate, GateMode::Tie, GateMode::Silent];

    /// Fraction of the interval the gate stays open: 0 means no output,
    /// 1 means held into the following step.
    pub fn duty_cycle(self) -> f64 {
        match self {
            GateMode::Gate => 0.9,
            GateMode::Tie => 1.0,
            GateMode::Silent => 0.0,
        }
    }

    /// Next mode in table order
    pub fn next(self) -> GateMode {
        match self {
            GateMode::Gate => GateMode::Tie,
            GateMode::Tie => GateMode::Silent,
            GateMode::Silent => GateMode::Gate,
        }
    }

    /// LED color while the cursor is on this step
    pub fn current_step_color(self) -> Color {
        match self {
            GateMode::Gate => Color::GREEN_3,
            GateMode::Tie => Color::YELLOW_3,
            GateMode::Silent => Color::RED_3,
        }
    }

    /// LED color for every other step
    pub fn other_step_color(self) -> Color {
        match self {
            GateMode::Gate => Color::OFF,
            GateMode::Tie => Color::YELLOW_2,
            GateMode::Silent => Color::RED_2,
        }
    }
}

impl Default for GateMode {
    fn default() -> Self {
        GateMode::Gate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_mode_cycle_order() {
        let mut mode = StepMode::Step;
        let mut seen = Vec::new();
        for _ in 0..4 {
            mode = mode.next();
            seen.push(mode);
        }
        assert_eq!(
            seen,
            vec![StepMode::Skip, StepMode::Reset, StepMode::Stop, StepMode::Step]
        );
    }

    #[test]
    fn test_step_mode_played_flags() {
        assert!(StepMode::Step.played());
        assert!(StepMode::Stop.played());
        assert!(!StepMode::Skip.played());
        assert!(!StepMode::Reset.played());
    }

    #[test]
    fn test_gate_mode_cycle_order() {
        assert_eq!(GateMode::Gate.next(), GateMode::Tie);
        assert_eq!(GateMode::Tie.next(), GateMode::Silent);
        assert_eq!(GateMode::Silent.next(), GateMode::Gate);
    }

    #[test]
    fn test_gate_duty_cycles() {
        assert_eq!(GateMode::Silent.duty_cycle(), 0.0);
        assert_eq!(GateMode::Tie.duty_cycle(), 1.0);
        let duty = GateMode::Gate.duty_cycle();
        assert!(duty > 0.0 && duty < 1.0);
    }

    #[test]
    fn test_mode_colors_distinguish_cursor() {
        for mode in StepMode::ALL {
            if mode == StepMode::Step || mode == StepMode::Stop {
                // Played modes highlight the cursor in bright green.
                assert_eq!(mode.current_step_color(), Color::GREEN_3);
            }
            assert_ne!(mode.current_step_color(), mode.other_step_color());
        }
    }
}
