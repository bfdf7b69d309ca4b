//! Campaign status state machine.
//!
//! This module lives in `core` (zero internal deps) so the transition rules
//! are shared by the spend-recording path, every reconciliation sweep and the
//! HTTP toggle endpoint. Callers never assign a status directly; they ask
//! [`apply`] what a [`Transition`] yields and persist that.
//!
//! ```text
//!                 PauseForBudget          PauseForDaypart
//!   any state ─────────────────► PAUSED_BUDGET / PAUSED_DAYPART
//!   any state ──Activate (only if can_run)──► ACTIVE
//!   any state ──Deactivate (manual)──► INACTIVE
//! ```
//!
//! The manual `is_active` switch is orthogonal: when off, activation is
//! refused but the stored status is left alone.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Campaign status IDs matching `campaign_statuses` seed data (1-based).
#[repr(i16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CampaignStatus {
    Active = 1,
    PausedBudget = 2,
    PausedDaypart = 3,
    Inactive = 4,
}

impl CampaignStatus {
    pub const ALL: [CampaignStatus; 4] = [
        CampaignStatus::Active,
        CampaignStatus::PausedBudget,
        CampaignStatus::PausedDaypart,
        CampaignStatus::Inactive,
    ];

    /// Return the database status ID.
    pub fn id(self) -> i16 {
        self as i16
    }

    /// Look up a status by its database ID.
    pub fn from_id(id: i16) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.id() == id)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CampaignStatus::Active => "ACTIVE",
            CampaignStatus::PausedBudget => "PAUSED_BUDGET",
            CampaignStatus::PausedDaypart => "PAUSED_DAYPART",
            CampaignStatus::Inactive => "INACTIVE",
        }
    }
}

impl fmt::Display for CampaignStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The three inputs of `can_run_now`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Eligibility {
    /// Manual kill switch.
    pub is_active: bool,
    /// Brand has both daily and monthly budget left today.
    pub has_budget: bool,
    /// Current brand-local time is inside a dayparting window.
    pub within_window: bool,
}

impl Eligibility {
    pub fn can_run(&self) -> bool {
        self.is_active && self.has_budget && self.within_window
    }
}

/// The four named status transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transition {
    PauseForBudget,
    PauseForDaypart,
    Activate,
    Deactivate,
}

impl Transition {
    pub fn target(self) -> CampaignStatus {
        match self {
            Transition::PauseForBudget => CampaignStatus::PausedBudget,
            Transition::PauseForDaypart => CampaignStatus::PausedDaypart,
            Transition::Activate => CampaignStatus::Active,
            Transition::Deactivate => CampaignStatus::Inactive,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Transition::PauseForBudget => "pause_for_budget",
            Transition::PauseForDaypart => "pause_for_daypart",
            Transition::Activate => "activate",
            Transition::Deactivate => "deactivate",
        }
    }
}

/// Resolve a transition against the campaign's current eligibility.
///
/// Returns the status to write, or `None` when the transition is a no-op
/// (an activation attempted while `can_run` is false). Pauses and manual
/// deactivation are unconditional; re-pausing an already paused campaign is
/// allowed and harmless.
pub fn apply(transition: Transition, eligibility: Eligibility) -> Option<CampaignStatus> {
    match transition {
        Transition::Activate if !eligibility.can_run() => None,
        t => Some(t.target()),
    }
}

// ---------------------------------------------------------------------------
// Sweep decision tables
// ---------------------------------------------------------------------------

/// Hourly dayparting sweep rule for one campaign.
pub fn dayparting_decision(
    status: CampaignStatus,
    within_window: bool,
    has_budget: bool,
) -> Option<Transition> {
    if within_window {
        (status == CampaignStatus::PausedDaypart && has_budget).then_some(Transition::Activate)
    } else {
        (status == CampaignStatus::Active).then_some(Transition::PauseForDaypart)
    }
}

/// Five-minute budget sweep rule for one campaign.
pub fn budget_decision(
    status: CampaignStatus,
    has_budget: bool,
    within_window: bool,
) -> Option<Transition> {
    match status {
        CampaignStatus::Active if !has_budget => Some(Transition::PauseForBudget),
        CampaignStatus::PausedBudget if has_budget && within_window => Some(Transition::Activate),
        _ => None,
    }
}

/// Rule applied right after a spend was recorded.
pub fn spend_decision(status: CampaignStatus, budget_exhausted: bool) -> Option<Transition> {
    (budget_exhausted && status == CampaignStatus::Active).then_some(Transition::PauseForBudget)
}

/// Rule applied to a brand's campaigns after a daily or monthly reset.
pub fn reset_decision(status: CampaignStatus) -> Option<Transition> {
    (status == CampaignStatus::PausedBudget).then_some(Transition::Activate)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RUNNABLE: Eligibility = Eligibility {
        is_active: true,
        has_budget: true,
        within_window: true,
    };

    fn with(is_active: bool, has_budget: bool, within_window: bool) -> Eligibility {
        Eligibility {
            is_active,
            has_budget,
            within_window,
        }
    }

    // -----------------------------------------------------------------------
    // Status ids
    // -----------------------------------------------------------------------

    #[test]
    fn ids_round_trip() {
        for status in CampaignStatus::ALL {
            assert_eq!(CampaignStatus::from_id(status.id()), Some(status));
        }
        assert_eq!(CampaignStatus::from_id(0), None);
        assert_eq!(CampaignStatus::from_id(5), None);
    }

    #[test]
    fn serializes_as_upper_case_name() {
        let json = serde_json::to_string(&CampaignStatus::PausedDaypart).unwrap();
        assert_eq!(json, "\"PAUSED_DAYPART\"");
        assert_eq!(CampaignStatus::PausedBudget.to_string(), "PAUSED_BUDGET");
    }

    // -----------------------------------------------------------------------
    // can_run / apply
    // -----------------------------------------------------------------------

    #[test]
    fn can_run_requires_all_three_conditions() {
        assert!(RUNNABLE.can_run());
        assert!(!with(false, true, true).can_run());
        assert!(!with(true, false, true).can_run());
        assert!(!with(true, true, false).can_run());
    }

    #[test]
    fn activate_is_self_checking() {
        assert_eq!(apply(Transition::Activate, RUNNABLE), Some(CampaignStatus::Active));
        assert_eq!(apply(Transition::Activate, with(true, false, true)), None);
        assert_eq!(apply(Transition::Activate, with(false, true, true)), None);
    }

    #[test]
    fn pauses_and_deactivate_are_unconditional() {
        let blocked = with(false, false, false);
        assert_eq!(
            apply(Transition::PauseForBudget, blocked),
            Some(CampaignStatus::PausedBudget)
        );
        assert_eq!(
            apply(Transition::PauseForDaypart, RUNNABLE),
            Some(CampaignStatus::PausedDaypart)
        );
        assert_eq!(apply(Transition::Deactivate, RUNNABLE), Some(CampaignStatus::Inactive));
    }

    // -----------------------------------------------------------------------
    // Sweep decisions
    // -----------------------------------------------------------------------

    #[test]
    fn dayparting_pauses_active_outside_window() {
        assert_eq!(
            dayparting_decision(CampaignStatus::Active, false, true),
            Some(Transition::PauseForDaypart)
        );
    }

    #[test]
    fn dayparting_reactivates_only_daypart_paused_with_budget() {
        assert_eq!(
            dayparting_decision(CampaignStatus::PausedDaypart, true, true),
            Some(Transition::Activate)
        );
        assert_eq!(dayparting_decision(CampaignStatus::PausedDaypart, true, false), None);
        assert_eq!(dayparting_decision(CampaignStatus::PausedBudget, true, true), None);
        assert_eq!(dayparting_decision(CampaignStatus::Inactive, true, true), None);
    }

    #[test]
    fn dayparting_leaves_non_active_alone_outside_window() {
        for status in [
            CampaignStatus::PausedBudget,
            CampaignStatus::PausedDaypart,
            CampaignStatus::Inactive,
        ] {
            assert_eq!(dayparting_decision(status, false, true), None);
        }
    }

    #[test]
    fn budget_pauses_active_when_exhausted() {
        assert_eq!(
            budget_decision(CampaignStatus::Active, false, true),
            Some(Transition::PauseForBudget)
        );
        assert_eq!(budget_decision(CampaignStatus::Active, true, false), None);
    }

    #[test]
    fn budget_reactivates_budget_paused_inside_window() {
        assert_eq!(
            budget_decision(CampaignStatus::PausedBudget, true, true),
            Some(Transition::Activate)
        );
        assert_eq!(budget_decision(CampaignStatus::PausedBudget, true, false), None);
        assert_eq!(budget_decision(CampaignStatus::PausedBudget, false, true), None);
    }

    #[test]
    fn budget_ignores_daypart_paused_and_inactive() {
        assert_eq!(budget_decision(CampaignStatus::PausedDaypart, false, true), None);
        assert_eq!(budget_decision(CampaignStatus::Inactive, true, true), None);
    }

    #[test]
    fn at_most_one_pause_per_tick() {
        // Once either sweep has paused the campaign, the other sweep's
        // condition no longer holds.
        let after_budget = CampaignStatus::PausedBudget;
        assert_eq!(dayparting_decision(after_budget, false, false), None);
        let after_daypart = CampaignStatus::PausedDaypart;
        assert_eq!(budget_decision(after_daypart, false, false), None);
    }

    #[test]
    fn spend_pauses_only_active_campaigns() {
        assert_eq!(
            spend_decision(CampaignStatus::Active, true),
            Some(Transition::PauseForBudget)
        );
        assert_eq!(spend_decision(CampaignStatus::Active, false), None);
        assert_eq!(spend_decision(CampaignStatus::PausedDaypart, true), None);
    }

    #[test]
    fn reset_targets_budget_paused_only() {
        assert_eq!(
            reset_decision(CampaignStatus::PausedBudget),
            Some(Transition::Activate)
        );
        assert_eq!(reset_decision(CampaignStatus::Active), None);
        assert_eq!(reset_decision(CampaignStatus::Inactive), None);
    }
}
