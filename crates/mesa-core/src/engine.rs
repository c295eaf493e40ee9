// SPDX-FileCopyrightText: 2026 Mesa Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The ticket transition engine.
//!
//! A pure function from a ticket's current lifecycle head and a newly
//! recorded response to the new head. The storage layer invokes it inside
//! the same transaction as the response insert, so the logic is unit-testable
//! without a database while the persisted state can never diverge from a
//! recorded response.
//!
//! Two independent concerns are encoded here: ownership stickiness (the first
//! agent to respond keeps the ticket) and status as an "awaiting whom" signal
//! (`pending` = waiting on the user, `open` = awaiting agent attention).

use crate::types::{AuthorType, LastAuthor, TicketStatus};

/// The lifecycle fields of a ticket the engine reads and writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketHead {
    pub status: TicketStatus,
    pub owner_agent_id: Option<String>,
    pub last_response_author_type: LastAuthor,
    pub first_response_at: Option<String>,
}

/// Which row of the transition table fired.
///
/// The storage layer uses this to pick the matching guarded UPDATE; in
/// particular `FirstAgentClaim` maps to a conditional
/// `WHERE owner_agent_id IS NULL` compare-and-swap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// First agent response: claim ownership, move to pending.
    FirstAgentClaim,
    /// Later agent response: ownership and status untouched.
    AgentFollowUp,
    /// User response to a pending ticket: back to open.
    UserReopen,
    /// User response to an open ticket: status unchanged.
    UserKeepOpen,
}

/// The engine's output: the new head and the rule that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub head: TicketHead,
    pub rule: Rule,
}

/// Apply a newly recorded response to the ticket head.
///
/// Preconditions (enforced by the response recorder, not here): the ticket
/// accepts responses (`status` is `open` or `pending`) and `content` has
/// already been validated.
///
/// `last_response_author_type` is stamped unconditionally on every response.
/// `owner_agent_id` and `first_response_at` are write-once: the engine never
/// moves them from `Some(x)` to anything else.
pub fn apply_response(
    head: &TicketHead,
    author_type: AuthorType,
    author_id: &str,
    now: &str,
) -> Transition {
    match author_type {
        AuthorType::Agent => {
            if head.owner_agent_id.is_none() {
                Transition {
                    head: TicketHead {
                        status: TicketStatus::Pending,
                        owner_agent_id: Some(author_id.to_string()),
                        last_response_author_type: LastAuthor::Agent,
                        first_response_at: Some(
                            head.first_response_at
                                .clone()
                                .unwrap_or_else(|| now.to_string()),
                        ),
                    },
                    rule: Rule::FirstAgentClaim,
                }
            } else {
                Transition {
                    head: TicketHead {
                        last_response_author_type: LastAuthor::Agent,
                        ..head.clone()
                    },
                    rule: Rule::AgentFollowUp,
                }
            }
        }
        AuthorType::User => {
            let (status, rule) = if head.status == TicketStatus::Pending {
                (TicketStatus::Open, Rule::UserReopen)
            } else {
                (head.status, Rule::UserKeepOpen)
            };
            Transition {
                head: TicketHead {
                    status,
                    last_response_author_type: LastAuthor::User,
                    ..head.clone()
                },
                rule,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh_head() -> TicketHead {
        TicketHead {
            status: TicketStatus::Open,
            owner_agent_id: None,
            last_response_author_type: LastAuthor::None,
            first_response_at: None,
        }
    }

    const T1: &str = "2026-02-01T10:00:00.000Z";
    const T2: &str = "2026-02-01T10:05:00.000Z";
    const T3: &str = "2026-02-01T10:10:00.000Z";

    #[test]
    fn first_agent_response_claims_and_moves_to_pending() {
        let t = apply_response(&fresh_head(), AuthorType::Agent, "agent-a", T1);
        assert_eq!(t.rule, Rule::FirstAgentClaim);
        assert_eq!(t.head.status, TicketStatus::Pending);
        assert_eq!(t.head.owner_agent_id.as_deref(), Some("agent-a"));
        assert_eq!(t.head.last_response_author_type, LastAuthor::Agent);
        assert_eq!(t.head.first_response_at.as_deref(), Some(T1));
    }

    #[test]
    fn ownership_sticks_to_first_agent_for_any_sequence() {
        // P1: for N agent responses the owner is always the first author.
        let mut head = fresh_head();
        for (i, agent) in ["agent-a", "agent-b", "agent-c", "agent-b"].iter().enumerate() {
            let t = apply_response(&head, AuthorType::Agent, agent, T1);
            head = t.head;
            assert_eq!(
                head.owner_agent_id.as_deref(),
                Some("agent-a"),
                "owner changed on response {i}"
            );
        }
    }

    #[test]
    fn first_response_at_is_set_once() {
        // P2: constant after the first agent response.
        let t1 = apply_response(&fresh_head(), AuthorType::Agent, "agent-a", T1);
        let t2 = apply_response(&t1.head, AuthorType::User, "user-1", T2);
        let t3 = apply_response(&t2.head, AuthorType::Agent, "agent-b", T3);
        assert_eq!(t1.head.first_response_at.as_deref(), Some(T1));
        assert_eq!(t2.head.first_response_at.as_deref(), Some(T1));
        assert_eq!(t3.head.first_response_at.as_deref(), Some(T1));
    }

    #[test]
    fn agent_follow_up_after_reopen_does_not_change_status() {
        // Only the very first agent response moves the status; a follow-up
        // to a reopened ticket leaves it open.
        let t1 = apply_response(&fresh_head(), AuthorType::Agent, "agent-a", T1);
        assert_eq!(t1.head.status, TicketStatus::Pending);

        let t2 = apply_response(&t1.head, AuthorType::User, "user-1", T2);
        assert_eq!(t2.rule, Rule::UserReopen);
        assert_eq!(t2.head.status, TicketStatus::Open);
        assert_eq!(t2.head.owner_agent_id.as_deref(), Some("agent-a"));

        let t3 = apply_response(&t2.head, AuthorType::Agent, "agent-a", T3);
        assert_eq!(t3.rule, Rule::AgentFollowUp);
        assert_eq!(t3.head.status, TicketStatus::Open);
        assert_eq!(t3.head.last_response_author_type, LastAuthor::Agent);
    }

    #[test]
    fn repeated_same_role_responses_do_not_change_status() {
        let t1 = apply_response(&fresh_head(), AuthorType::Agent, "agent-a", T1);
        let t2 = apply_response(&t1.head, AuthorType::Agent, "agent-a", T2);
        assert_eq!(t2.head.status, TicketStatus::Pending);

        let t3 = apply_response(&t2.head, AuthorType::User, "user-1", T3);
        let t4 = apply_response(&t3.head, AuthorType::User, "user-1", T3);
        assert_eq!(t3.head.status, TicketStatus::Open);
        assert_eq!(t4.rule, Rule::UserKeepOpen);
        assert_eq!(t4.head.status, TicketStatus::Open);
    }

    #[test]
    fn last_author_tracks_every_response() {
        // P4: stamped unconditionally, independent of status or ownership.
        let t1 = apply_response(&fresh_head(), AuthorType::User, "user-1", T1);
        assert_eq!(t1.head.last_response_author_type, LastAuthor::User);
        let t2 = apply_response(&t1.head, AuthorType::Agent, "agent-a", T2);
        assert_eq!(t2.head.last_response_author_type, LastAuthor::Agent);
        let t3 = apply_response(&t2.head, AuthorType::Agent, "agent-b", T3);
        assert_eq!(t3.head.last_response_author_type, LastAuthor::Agent);
        let t4 = apply_response(&t3.head, AuthorType::User, "user-1", T3);
        assert_eq!(t4.head.last_response_author_type, LastAuthor::User);
    }

    #[test]
    fn user_responses_never_assign() {
        // P5: only-user sequences leave the ticket unassigned forever.
        let mut head = fresh_head();
        for _ in 0..5 {
            let t = apply_response(&head, AuthorType::User, "user-1", T1);
            head = t.head;
            assert!(head.owner_agent_id.is_none());
            assert_eq!(head.status, TicketStatus::Open);
            assert!(head.first_response_at.is_none());
        }
    }

    #[test]
    fn pending_second_transition_keeps_earlier_first_response_at() {
        let head = TicketHead {
            status: TicketStatus::Open,
            owner_agent_id: None,
            last_response_author_type: LastAuthor::User,
            first_response_at: Some(T1.to_string()),
        };
        // Owner missing but first_response_at present (explicit unassignment
        // outside the engine): the claim must not overwrite the timestamp.
        let t = apply_response(&head, AuthorType::Agent, "agent-z", T3);
        assert_eq!(t.head.first_response_at.as_deref(), Some(T1));
        assert_eq!(t.head.owner_agent_id.as_deref(), Some("agent-z"));
    }
}
