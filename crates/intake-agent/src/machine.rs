// SPDX-FileCopyrightText: 2026 Intake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pure dispatch from `(stage, intent)` to the action the engine performs.
//!
//! Nothing here touches the network, the counter, or the session store. The
//! engine looks up the session, classifies the text, asks [`route`] what to
//! do, and then carries it out.

use crate::intent::Intent;
use crate::session::Stage;

/// How a new ticket flow was entered. Only the wording of the reply differs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// Confirmed from the welcome prompt.
    Welcome,
    /// Option 1 of the active-ticket menu.
    Menu,
}

/// Effect selected for one inbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// No session, greeting: look up tickets and open the right menu.
    Greet,
    /// No session, anything else: static instructions, no session.
    Instruct,
    /// Release any reservation and show the stop menu.
    Stop,
    /// Release any reservation and start over with a fresh id.
    Restart,
    BeginTicket(Origin),
    DeclineStart,
    RepromptConfirm,
    RecordSchoolCode,
    RepromptSchoolCode,
    RecordStudentPin,
    RepromptStudentPin,
    /// Accumulate text and media, then submit once the description is long enough.
    AppendDetails,
    ShowCloseList,
    ShowStatusReport,
    RepromptExistingChoice,
    /// Close the listed ticket at this zero-based index.
    CloseSelected(usize),
    RepromptCloseSelection,
    ExitFromStop,
    RepromptStopChoice,
    ConfirmResolved,
    ReopenTicket,
    RepromptNumericConfirmation,
    RecordReopenReason,
    RepromptReopenReason,
}

impl Action {
    /// Re-prompts leave the session, its details and the reservation untouched.
    pub fn is_reprompt(self) -> bool {
        matches!(
            self,
            Action::RepromptConfirm
                | Action::RepromptSchoolCode
                | Action::RepromptStudentPin
                | Action::RepromptExistingChoice
                | Action::RepromptCloseSelection
                | Action::RepromptStopChoice
                | Action::RepromptNumericConfirmation
                | Action::RepromptReopenReason
        )
    }
}

/// Select the action for `intent` at `stage`.
///
/// `listed` is the number of tickets shown to the user in the close list and
/// bounds the valid selections at [`Stage::AwaitCloseSelection`].
pub fn route(stage: Option<Stage>, intent: Intent, listed: usize) -> Action {
    use Intent as I;
    use Stage as S;

    match (stage, intent) {
        (None, I::Greeting) => Action::Greet,
        (None, _) => Action::Instruct,

        (Some(_), I::Stop) => Action::Stop,
        (Some(_), I::Restart) => Action::Restart,

        (Some(S::ConfirmStart), I::Affirm) => Action::BeginTicket(Origin::Welcome),
        (Some(S::ConfirmStart), I::Decline) => Action::DeclineStart,
        (Some(S::ConfirmStart), _) => Action::RepromptConfirm,

        (Some(S::AwaitSchoolCode), I::Empty) => Action::RepromptSchoolCode,
        (Some(S::AwaitSchoolCode), _) => Action::RecordSchoolCode,

        (Some(S::AwaitStudentPin), I::Empty) => Action::RepromptStudentPin,
        (Some(S::AwaitStudentPin), _) => Action::RecordStudentPin,

        // Media can arrive without any text.
        (Some(S::AwaitDetailsAndMedia), _) => Action::AppendDetails,

        (Some(S::ExistingTicketChoice), I::Choice(1)) => Action::BeginTicket(Origin::Menu),
        (Some(S::ExistingTicketChoice), I::Choice(2)) => Action::ShowCloseList,
        (Some(S::ExistingTicketChoice), I::Choice(3)) => Action::ShowStatusReport,
        (Some(S::ExistingTicketChoice), _) => Action::RepromptExistingChoice,

        (Some(S::AwaitCloseSelection), I::Choice(n)) if n >= 1 && (n as usize) <= listed => {
            Action::CloseSelected(n as usize - 1)
        }
        (Some(S::AwaitCloseSelection), _) => Action::RepromptCloseSelection,

        (Some(S::AwaitStopChoice), I::Choice(1)) => Action::Restart,
        (Some(S::AwaitStopChoice), I::Choice(2)) => Action::ExitFromStop,
        (Some(S::AwaitStopChoice), _) => Action::RepromptStopChoice,

        (Some(S::AwaitNumericConfirmation), I::Choice(1)) => Action::ConfirmResolved,
        (Some(S::AwaitNumericConfirmation), I::Choice(2)) => Action::ReopenTicket,
        (Some(S::AwaitNumericConfirmation), _) => Action::RepromptNumericConfirmation,

        (Some(S::AwaitReopenReason), I::Empty) => Action::RepromptReopenReason,
        (Some(S::AwaitReopenReason), _) => Action::RecordReopenReason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intent::classify;
    use proptest::prelude::*;

    const ALL_STAGES: [Stage; 9] = [
        Stage::ConfirmStart,
        Stage::AwaitSchoolCode,
        Stage::AwaitStudentPin,
        Stage::AwaitDetailsAndMedia,
        Stage::ExistingTicketChoice,
        Stage::AwaitCloseSelection,
        Stage::AwaitStopChoice,
        Stage::AwaitNumericConfirmation,
        Stage::AwaitReopenReason,
    ];

    fn dispatch(stage: Option<Stage>, text: &str) -> Action {
        route(stage, classify(stage, text), 2)
    }

    #[test]
    fn no_session_greets_or_instructs() {
        assert_eq!(dispatch(None, "Hi"), Action::Greet);
        assert_eq!(dispatch(None, "stop"), Action::Instruct);
        assert_eq!(dispatch(None, "1"), Action::Instruct);
        assert_eq!(dispatch(None, ""), Action::Instruct);
    }

    #[test]
    fn interrupts_apply_at_every_stage() {
        for stage in ALL_STAGES {
            assert_eq!(dispatch(Some(stage), "Stop"), Action::Stop, "{stage}");
            assert_eq!(dispatch(Some(stage), "begin again"), Action::Restart, "{stage}");
        }
    }

    #[test]
    fn confirm_start_branches() {
        let s = Some(Stage::ConfirmStart);
        assert_eq!(dispatch(s, "Sure"), Action::BeginTicket(Origin::Welcome));
        assert_eq!(dispatch(s, "n"), Action::DeclineStart);
        assert_eq!(dispatch(s, "later"), Action::RepromptConfirm);
        assert_eq!(dispatch(s, "cancel"), Action::Stop);
    }

    #[test]
    fn intake_fields() {
        assert_eq!(
            dispatch(Some(Stage::AwaitSchoolCode), "abc12"),
            Action::RecordSchoolCode
        );
        assert_eq!(
            dispatch(Some(Stage::AwaitSchoolCode), "  "),
            Action::RepromptSchoolCode
        );
        assert_eq!(
            dispatch(Some(Stage::AwaitStudentPin), "1234"),
            Action::RecordStudentPin
        );
        assert_eq!(
            dispatch(Some(Stage::AwaitStudentPin), ""),
            Action::RepromptStudentPin
        );
        assert_eq!(
            dispatch(Some(Stage::AwaitDetailsAndMedia), ""),
            Action::AppendDetails
        );
    }

    #[test]
    fn existing_ticket_menu() {
        let s = Some(Stage::ExistingTicketChoice);
        assert_eq!(dispatch(s, "1"), Action::BeginTicket(Origin::Menu));
        assert_eq!(dispatch(s, "2"), Action::ShowCloseList);
        assert_eq!(dispatch(s, "3"), Action::ShowStatusReport);
        assert_eq!(dispatch(s, "4"), Action::RepromptExistingChoice);
        assert_eq!(dispatch(s, "one"), Action::RepromptExistingChoice);
    }

    #[test]
    fn close_selection_is_bounded_by_listing() {
        let s = Some(Stage::AwaitCloseSelection);
        assert_eq!(route(s, Intent::Choice(1), 3), Action::CloseSelected(0));
        assert_eq!(route(s, Intent::Choice(3), 3), Action::CloseSelected(2));
        assert_eq!(route(s, Intent::Choice(4), 3), Action::RepromptCloseSelection);
        assert_eq!(route(s, Intent::Choice(0), 3), Action::RepromptCloseSelection);
        assert_eq!(route(s, Intent::Text, 3), Action::RepromptCloseSelection);
        assert_eq!(route(s, Intent::Choice(1), 0), Action::RepromptCloseSelection);
    }

    #[test]
    fn stop_menu_and_resolution_prompts() {
        assert_eq!(dispatch(Some(Stage::AwaitStopChoice), "1"), Action::Restart);
        assert_eq!(
            dispatch(Some(Stage::AwaitStopChoice), "2"),
            Action::ExitFromStop
        );
        assert_eq!(
            dispatch(Some(Stage::AwaitStopChoice), "x"),
            Action::RepromptStopChoice
        );
        assert_eq!(
            dispatch(Some(Stage::AwaitNumericConfirmation), "1"),
            Action::ConfirmResolved
        );
        assert_eq!(
            dispatch(Some(Stage::AwaitNumericConfirmation), "2"),
            Action::ReopenTicket
        );
        assert_eq!(
            dispatch(Some(Stage::AwaitNumericConfirmation), "yes"),
            Action::RepromptNumericConfirmation
        );
        assert_eq!(
            dispatch(Some(Stage::AwaitReopenReason), "still broken"),
            Action::RecordReopenReason
        );
        assert_eq!(
            dispatch(Some(Stage::AwaitReopenReason), " "),
            Action::RepromptReopenReason
        );
    }

    fn arb_stage() -> impl Strategy<Value = Stage> {
        proptest::sample::select(ALL_STAGES.to_vec())
    }

    proptest! {
        #[test]
        fn sessionless_input_never_reprompts(text in ".{0,40}") {
            let action = dispatch(None, &text);
            prop_assert!(action == Action::Greet || action == Action::Instruct);
        }

        #[test]
        fn menus_reprompt_on_non_numeric_text(stage in arb_stage(), text in "[a-z]{2,12}") {
            let intent = classify(Some(stage), &text);
            prop_assume!(!matches!(intent, Intent::Stop | Intent::Restart | Intent::Affirm | Intent::Decline));
            let action = route(Some(stage), intent, 5);
            match stage {
                Stage::ConfirmStart
                | Stage::ExistingTicketChoice
                | Stage::AwaitCloseSelection
                | Stage::AwaitStopChoice
                | Stage::AwaitNumericConfirmation => prop_assert!(action.is_reprompt()),
                _ => prop_assert!(!action.is_reprompt()),
            }
        }

        #[test]
        fn close_selection_index_stays_in_range(n in 0u32..50, listed in 0usize..10) {
            if let Action::CloseSelected(idx) = route(Some(Stage::AwaitCloseSelection), Intent::Choice(n), listed) {
                prop_assert!(idx < listed);
            }
        }
    }
}
