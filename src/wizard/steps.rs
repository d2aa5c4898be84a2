//! Wizard step identifiers and the transition table.
//!
//! The step order is data, not code position: [`WizardStep::next`] is the
//! single source of truth, so the state machine can be tested on its own.

/// One step of the content-intake wizard, in fixed order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WizardStep {
    /// Video or document file reference.
    #[default]
    File,
    /// Unique numeric code.
    Code,
    /// Title, minimum two characters.
    Title,
    /// Genre text, minimum two characters.
    Genre,
    /// Optional description.
    Description,
    /// Optional release year.
    Year,
    /// Optional country text.
    Country,
    /// Optional runtime in minutes.
    Duration,
    /// Quality tier.
    Quality,
    /// Optional external rating.
    ExternalRating,
    /// Optional thumbnail image.
    Thumbnail,
}

impl WizardStep {
    /// Total number of steps, for "N/11" prompts.
    pub const COUNT: usize = 11;

    /// The step a fresh session starts at.
    #[must_use]
    pub const fn first() -> Self {
        Self::File
    }

    /// The step after this one; `None` after the last step.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::File => Some(Self::Code),
            Self::Code => Some(Self::Title),
            Self::Title => Some(Self::Genre),
            Self::Genre => Some(Self::Description),
            Self::Description => Some(Self::Year),
            Self::Year => Some(Self::Country),
            Self::Country => Some(Self::Duration),
            Self::Duration => Some(Self::Quality),
            Self::Quality => Some(Self::ExternalRating),
            Self::ExternalRating => Some(Self::Thumbnail),
            Self::Thumbnail => None,
        }
    }

    /// One-based position in the sequence.
    #[must_use]
    pub const fn ordinal(self) -> usize {
        match self {
            Self::File => 1,
            Self::Code => 2,
            Self::Title => 3,
            Self::Genre => 4,
            Self::Description => 5,
            Self::Year => 6,
            Self::Country => 7,
            Self::Duration => 8,
            Self::Quality => 9,
            Self::ExternalRating => 10,
            Self::Thumbnail => 11,
        }
    }

    /// Whether the skip token is accepted at this step.
    #[must_use]
    pub const fn skippable(self) -> bool {
        matches!(
            self,
            Self::Description
                | Self::Year
                | Self::Country
                | Self::Duration
                | Self::ExternalRating
                | Self::Thumbnail
        )
    }

    /// The prompt shown when this step becomes active.
    #[must_use]
    pub const fn prompt(self) -> &'static str {
        match self {
            Self::File => "Send the movie file (video or document).",
            Self::Code => "Enter a unique numeric code, e.g. 1234.",
            Self::Title => "Enter the title, e.g. Avatar 2.",
            Self::Genre => "Enter the genre(s), comma separated.",
            Self::Description => "Enter a description, or /skip.",
            Self::Year => "Enter the release year, e.g. 2024, or /skip.",
            Self::Country => "Enter the country, or /skip.",
            Self::Duration => "Enter the runtime in minutes, e.g. 120, or /skip.",
            Self::Quality => "Pick the quality: CAM, HD, FullHD or 4K.",
            Self::ExternalRating => "Enter the IMDb rating, e.g. 8.5, or /skip.",
            Self::Thumbnail => "Send a thumbnail image, or /skip.",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transition_chain_visits_every_step_once() {
        let mut seen = vec![WizardStep::first()];
        let mut step = WizardStep::first();
        while let Some(next) = step.next() {
            assert!(!seen.contains(&next), "step revisited: {next:?}");
            seen.push(next);
            step = next;
        }
        assert_eq!(seen.len(), WizardStep::COUNT);
        assert_eq!(step, WizardStep::Thumbnail);
    }

    #[test]
    fn test_ordinals_follow_transition_order() {
        let mut step = WizardStep::first();
        let mut expected = 1;
        loop {
            assert_eq!(step.ordinal(), expected);
            match step.next() {
                Some(next) => {
                    step = next;
                    expected += 1;
                }
                None => break,
            }
        }
        assert_eq!(expected, WizardStep::COUNT);
    }

    #[test]
    fn test_required_steps_are_not_skippable() {
        for step in [
            WizardStep::File,
            WizardStep::Code,
            WizardStep::Title,
            WizardStep::Genre,
            WizardStep::Quality,
        ] {
            assert!(!step.skippable(), "{step:?} must not be skippable");
        }
        assert!(WizardStep::Year.skippable());
        assert!(WizardStep::Thumbnail.skippable());
    }
}
