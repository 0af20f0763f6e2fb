use std::sync::Arc;

use chrono::NaiveDate;

use crate::database::{StatusChange, Store, TransitionOutcome};
use crate::error::{Error, Result};
use crate::models::{
    account::Role,
    application::{Application, ApplicationStatus, NewApplication},
    internship::{Internship, InternshipStatus},
    student::StudentProfile,
};

/// A request to move an existing application forward (or into `Rejected`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    CompanyReview {
        accept: bool,
        comment: Option<String>,
    },
    FacultyApprove {
        approve: bool,
    },
    AdminApprove {
        approve: bool,
    },
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::CompanyReview { .. } => "company-review",
            Action::FacultyApprove { .. } => "faculty-approve",
            Action::AdminApprove { .. } => "admin-approve",
        }
    }

    fn is_positive(&self) -> bool {
        match self {
            Action::CompanyReview { accept, .. } => *accept,
            Action::FacultyApprove { approve } | Action::AdminApprove { approve } => *approve,
        }
    }

    /// The only state the action applies to and where a positive outcome lands.
    fn stage(&self) -> (ApplicationStatus, ApplicationStatus) {
        match self {
            Action::CompanyReview { .. } => (
                ApplicationStatus::Submitted,
                ApplicationStatus::ReviewedByCompany,
            ),
            Action::FacultyApprove { .. } => (
                ApplicationStatus::ReviewedByCompany,
                ApplicationStatus::ApprovedByFaculty,
            ),
            Action::AdminApprove { .. } => (
                ApplicationStatus::ApprovedByFaculty,
                ApplicationStatus::ApprovedByAdmin,
            ),
        }
    }

    pub fn permits(&self, role: Role) -> bool {
        match (self, role) {
            (Action::CompanyReview { .. }, Role::Company) => true,
            (Action::FacultyApprove { .. }, Role::Faculty | Role::Admin) => true,
            (Action::AdminApprove { .. }, Role::Admin) => true,
            (_, Role::Student | Role::Company | Role::Faculty | Role::Admin) => false,
        }
    }

    fn review_comment(&self) -> Option<String> {
        match self {
            Action::CompanyReview { comment, .. } => comment.clone(),
            Action::FacultyApprove { .. } | Action::AdminApprove { .. } => None,
        }
    }
}

/// The transition table. Pure: no store access, no side effects.
pub fn next_status(
    current: ApplicationStatus,
    action: &Action,
    actor: Role,
) -> Result<ApplicationStatus> {
    if !action.permits(actor) {
        return Err(Error::InvalidTransition(format!(
            "{} may not {}",
            actor,
            action.name()
        )));
    }
    let (from, to) = action.stage();
    if current != from {
        return Err(Error::InvalidTransition(format!(
            "cannot {} an application in state {}",
            action.name(),
            current
        )));
    }
    Ok(if action.is_positive() {
        to
    } else {
        ApplicationStatus::Rejected
    })
}

/// Seats not yet taken by fully approved applications.
pub fn remaining_seats(internship: &Internship, approved: i64) -> i64 {
    (i64::from(internship.seats) - approved).max(0)
}

#[derive(Clone)]
pub struct LifecycleEngine {
    store: Arc<dyn Store>,
}

impl LifecycleEngine {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Creation transition: nothing exists for the pair yet, the result is `Submitted`.
    pub async fn submit(
        &self,
        student: &StudentProfile,
        internship: &Internship,
        position_title: String,
        today: NaiveDate,
    ) -> Result<Application> {
        if self
            .store
            .find_application_by_pair(student.id, internship.id)
            .await?
            .is_some()
        {
            return Err(Error::DuplicateApplication);
        }
        if internship.status_on(today) == InternshipStatus::Closed {
            return Err(Error::InternshipClosed);
        }
        self.ensure_seat_available(internship).await?;

        let application = self
            .store
            .insert_application(NewApplication {
                student_id: student.id,
                internship_id: internship.id,
                position_title,
            })
            .await?;
        tracing::info!(
            application_id = application.id,
            student_id = student.id,
            internship_id = internship.id,
            "application submitted"
        );
        Ok(application)
    }

    /// Validates against `application.status` as read by the caller and writes only if the
    /// stored status still matches it.
    pub async fn transition(
        &self,
        application: &Application,
        action: &Action,
        actor: Role,
    ) -> Result<Application> {
        let next = next_status(application.status, action, actor).map_err(|err| {
            tracing::warn!(
                application_id = application.id,
                from = %application.status,
                action = action.name(),
                "transition refused"
            );
            err
        })?;

        // The seat check runs inside the store's swap so concurrent approvals cannot overfill.
        let outcome = self
            .store
            .transition_status(StatusChange {
                id: application.id,
                expected: application.status,
                next,
                review_comment: action.review_comment(),
                claims_seat: next == ApplicationStatus::ApprovedByAdmin,
            })
            .await?;
        let updated = match outcome {
            TransitionOutcome::Applied(updated) => updated,
            TransitionOutcome::NoSeats => {
                tracing::warn!(
                    application_id = application.id,
                    internship_id = application.internship_id,
                    "no seats left for approval"
                );
                return Err(Error::SeatsExhausted);
            }
            TransitionOutcome::Stale => {
                tracing::warn!(
                    application_id = application.id,
                    expected = %application.status,
                    action = action.name(),
                    "stale application state"
                );
                return Err(Error::InvalidTransition(format!(
                    "application {} changed while {} was in progress",
                    application.id,
                    action.name()
                )));
            }
        };

        tracing::info!(
            application_id = updated.id,
            from = %application.status,
            to = %updated.status,
            action = action.name(),
            terminal = updated.status.is_terminal(),
            "application transitioned"
        );
        Ok(updated)
    }

    async fn ensure_seat_available(&self, internship: &Internship) -> Result<()> {
        let approved = self
            .store
            .count_applications_in_status(internship.id, ApplicationStatus::ApprovedByAdmin)
            .await?;
        if remaining_seats(internship, approved) == 0 {
            return Err(Error::SeatsExhausted);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::database::MockStore;
    use crate::models::application::ApplicationStatus::*;

    fn actions() -> Vec<Action> {
        let mut all = Vec::new();
        for positive in [true, false] {
            all.push(Action::CompanyReview {
                accept: positive,
                comment: None,
            });
            all.push(Action::FacultyApprove { approve: positive });
            all.push(Action::AdminApprove { approve: positive });
        }
        all
    }

    fn authorized_actor(action: &Action) -> Role {
        match action {
            Action::CompanyReview { .. } => Role::Company,
            Action::FacultyApprove { .. } => Role::Faculty,
            Action::AdminApprove { .. } => Role::Admin,
        }
    }

    fn expected(current: ApplicationStatus, action: &Action) -> Option<ApplicationStatus> {
        match (current, action) {
            (Submitted, Action::CompanyReview { accept: true, .. }) => Some(ReviewedByCompany),
            (Submitted, Action::CompanyReview { accept: false, .. }) => Some(Rejected),
            (ReviewedByCompany, Action::FacultyApprove { approve: true }) => {
                Some(ApprovedByFaculty)
            }
            (ReviewedByCompany, Action::FacultyApprove { approve: false }) => Some(Rejected),
            (ApprovedByFaculty, Action::AdminApprove { approve: true }) => Some(ApprovedByAdmin),
            (ApprovedByFaculty, Action::AdminApprove { approve: false }) => Some(Rejected),
            _ => None,
        }
    }

    #[test]
    fn transition_table_matches_documented_lifecycle() {
        for current in ApplicationStatus::ALL {
            for action in actions() {
                let outcome = next_status(current, &action, authorized_actor(&action));
                match expected(current, &action) {
                    Some(next) => assert_eq!(outcome.unwrap(), next, "{current} / {action:?}"),
                    None => assert!(
                        matches!(outcome, Err(Error::InvalidTransition(_))),
                        "{current} / {action:?} should be refused"
                    ),
                }
            }
        }
    }

    #[test]
    fn terminal_states_are_never_left() {
        for current in [Rejected, ApprovedByAdmin] {
            for action in actions() {
                for actor in [Role::Student, Role::Company, Role::Faculty, Role::Admin] {
                    assert!(next_status(current, &action, actor).is_err());
                }
            }
        }
    }

    #[test]
    fn faculty_stage_accepts_admin_but_admin_stage_rejects_faculty() {
        let faculty = Action::FacultyApprove { approve: true };
        let admin = Action::AdminApprove { approve: true };
        assert_eq!(
            next_status(ReviewedByCompany, &faculty, Role::Admin).unwrap(),
            ApprovedByFaculty
        );
        assert!(matches!(
            next_status(ApprovedByFaculty, &admin, Role::Faculty),
            Err(Error::InvalidTransition(_))
        ));
    }

    #[test]
    fn remaining_seats_never_goes_negative() {
        let internship = Internship {
            id: 1,
            company_id: 1,
            title: "Data intern".into(),
            description: None,
            location: None,
            seats: 2,
            start_date: None,
            end_date: None,
            created_at: Utc::now(),
        };
        assert_eq!(remaining_seats(&internship, 0), 2);
        assert_eq!(remaining_seats(&internship, 2), 0);
        assert_eq!(remaining_seats(&internship, 5), 0);
    }

    #[tokio::test]
    async fn refused_transition_never_writes() {
        let mut store = MockStore::new();
        store.expect_transition_status().never();
        let engine = LifecycleEngine::new(Arc::new(store));
        let now = Utc::now();
        let application = Application {
            id: 4,
            student_id: 1,
            internship_id: 5,
            position_title: "Intern".into(),
            status: Rejected,
            review_comment: None,
            applied_at: now,
            updated_at: now,
        };

        let err = engine
            .transition(&application, &Action::AdminApprove { approve: true }, Role::Admin)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidTransition(_)));
    }

    #[tokio::test]
    async fn lost_compare_and_swap_reports_invalid_transition() {
        let mut store = MockStore::new();
        store
            .expect_transition_status()
            .times(1)
            .returning(|_| Ok(TransitionOutcome::Stale));
        let engine = LifecycleEngine::new(Arc::new(store));
        let now = Utc::now();
        let application = Application {
            id: 4,
            student_id: 1,
            internship_id: 5,
            position_title: "Intern".into(),
            status: Submitted,
            review_comment: None,
            applied_at: now,
            updated_at: now,
        };

        let err = engine
            .transition(
                &application,
                &Action::CompanyReview {
                    accept: true,
                    comment: None,
                },
                Role::Company,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidTransition(_)));
    }

    #[tokio::test]
    async fn admin_approval_claims_a_seat_and_maps_exhaustion() {
        let mut store = MockStore::new();
        store
            .expect_transition_status()
            .withf(|change| change.claims_seat && change.next == ApprovedByAdmin)
            .times(1)
            .returning(|_| Ok(TransitionOutcome::NoSeats));
        store.expect_count_applications_in_status().never();
        let engine = LifecycleEngine::new(Arc::new(store));
        let now = Utc::now();
        let application = Application {
            id: 9,
            student_id: 1,
            internship_id: 5,
            position_title: "Intern".into(),
            status: ApprovedByFaculty,
            review_comment: None,
            applied_at: now,
            updated_at: now,
        };

        let err = engine
            .transition(&application, &Action::AdminApprove { approve: true }, Role::Admin)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::SeatsExhausted));
    }

    #[tokio::test]
    async fn rejection_does_not_claim_a_seat() {
        let mut store = MockStore::new();
        store
            .expect_transition_status()
            .withf(|change| !change.claims_seat && change.next == Rejected)
            .times(1)
            .returning(|change| {
                let now = Utc::now();
                Ok(TransitionOutcome::Applied(Application {
                    id: change.id,
                    student_id: 1,
                    internship_id: 5,
                    position_title: "Intern".into(),
                    status: change.next,
                    review_comment: None,
                    applied_at: now,
                    updated_at: now,
                }))
            });
        let engine = LifecycleEngine::new(Arc::new(store));
        let now = Utc::now();
        let application = Application {
            id: 9,
            student_id: 1,
            internship_id: 5,
            position_title: "Intern".into(),
            status: ApprovedByFaculty,
            review_comment: None,
            applied_at: now,
            updated_at: now,
        };

        let updated = engine
            .transition(&application, &Action::AdminApprove { approve: false }, Role::Admin)
            .await
            .unwrap();
        assert_eq!(updated.status, Rejected);
    }
}
