//! # Setup Wizard
//!
//! Walks the user through the screens the current state requires, in a
//! fixed order: language, save folder, mappings. A first run requires all
//! of them.
//!
//! Each screen receives a [`NextGate`] at init and opens it once its step is
//! complete. The wizard refuses to advance while the gate is closed and
//! closes it again on every move.

use bridge_traits::screen::{NextGate, Screen};
use std::collections::VecDeque;
use std::fmt;
use std::ops::{BitOr, BitOrAssign};
use tracing::debug;

/// Set of setup steps that must run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SetupRequirements(u8);

impl SetupRequirements {
    pub const NONE: Self = Self(0);
    pub const FIRST_RUN: Self = Self(1);
    pub const LANGUAGE: Self = Self(1 << 1);
    pub const SAVE_FOLDER: Self = Self(1 << 2);
    pub const MAPPINGS: Self = Self(1 << 3);

    pub fn bits(&self) -> u8 {
        self.0
    }

    pub fn from_bits(bits: u8) -> Self {
        Self(bits & 0b1111)
    }

    pub fn contains(&self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Steps to show, in display order.
    pub fn steps(&self) -> Vec<SetupStep> {
        let first_run = self.contains(Self::FIRST_RUN);
        [
            (Self::LANGUAGE, SetupStep::Language),
            (Self::SAVE_FOLDER, SetupStep::SaveFolder),
            (Self::MAPPINGS, SetupStep::Mappings),
        ]
        .into_iter()
        .filter(|(flag, _)| first_run || self.contains(*flag))
        .map(|(_, step)| step)
        .collect()
    }
}

impl BitOr for SetupRequirements {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for SetupRequirements {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SetupStep {
    Language,
    SaveFolder,
    Mappings,
}

impl SetupStep {
    pub fn route(&self) -> &'static str {
        match self {
            SetupStep::Language => "language",
            SetupStep::SaveFolder => "saveFolder",
            SetupStep::Mappings => "mappings",
        }
    }
}

/// Builds the screen for a step.
pub trait ScreenFactory {
    fn create(&self, step: SetupStep) -> Box<dyn Screen>;
}

impl<F> ScreenFactory for F
where
    F: Fn(SetupStep) -> Box<dyn Screen>,
{
    fn create(&self, step: SetupStep) -> Box<dyn Screen> {
        self(step)
    }
}

/// Outcome of [`SetupWizard::next`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WizardStep {
    /// The current screen has not opened the gate
    Blocked,
    /// Show the screen at this route
    Navigate(String),
    /// No screens left
    Finished,
}

pub struct SetupWizard {
    screens: VecDeque<Box<dyn Screen>>,
    gate: NextGate,
}

impl SetupWizard {
    /// Creates and initializes the screens `requirements` call for.
    pub fn new(requirements: SetupRequirements, factory: &dyn ScreenFactory) -> Self {
        let gate = NextGate::new();
        let screens = requirements
            .steps()
            .into_iter()
            .map(|step| {
                let mut screen = factory.create(step);
                screen.init(gate.clone());
                screen
            })
            .collect::<VecDeque<_>>();

        debug!(
            requirements = requirements.bits(),
            screens = screens.len(),
            "Setup wizard created"
        );
        Self { screens, gate }
    }

    pub fn allow_next(&self, allowed: bool) {
        self.gate.allow(allowed);
    }

    pub fn can_go_next(&self) -> bool {
        self.gate.is_allowed()
    }

    pub fn current_route(&self) -> Option<&str> {
        self.screens.front().map(|s| s.route())
    }

    pub fn remaining(&self) -> usize {
        self.screens.len()
    }

    pub fn is_finished(&self) -> bool {
        self.screens.is_empty()
    }

    /// Leaves the current screen if its gate is open.
    pub fn next(&mut self) -> WizardStep {
        if self.screens.is_empty() {
            return WizardStep::Finished;
        }
        if !self.gate.is_allowed() {
            return WizardStep::Blocked;
        }

        if let Some(mut current) = self.screens.pop_front() {
            current.on_leave();
        }
        self.gate.allow(false);

        match self.screens.front() {
            Some(screen) => WizardStep::Navigate(screen.route().to_string()),
            None => WizardStep::Finished,
        }
    }
}

impl fmt::Debug for SetupWizard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SetupWizard")
            .field("current", &self.current_route())
            .field("remaining", &self.remaining())
            .field("can_go_next", &self.can_go_next())
            .finish()
    }
}
