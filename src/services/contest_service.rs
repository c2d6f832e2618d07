//! Contest service
//!
//! Records judged attempts in the contest log and keeps the scoreboard's
//! accepted counter in step with first accepted solutions.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::{
    constants::ENROLLMENT_ENROLLED,
    db::ContestStore,
    error::{AppError, AppResult},
    handlers::contests::request::{CreateContestChoiceRequest, CreateContestSubmissionRequest},
    models::{Contest, ContestSubmission, ContestSubmissionNames, NewContestSubmission, Submission},
};

use super::submission_service::SubmissionService;

/// Contest log row with display names and the first-accept outcome
#[derive(Debug, Clone)]
pub struct ContestSubmissionDetail {
    pub contest_submission: ContestSubmission,
    pub names: ContestSubmissionNames,
    /// This attempt was the student's first accepted solution to the problem
    pub first_accepted: bool,
}

/// Contest service for business logic
#[derive(Clone)]
pub struct ContestService {
    contests: Arc<dyn ContestStore>,
    submissions: Arc<SubmissionService>,
}

impl ContestService {
    pub fn new(contests: Arc<dyn ContestStore>, submissions: Arc<SubmissionService>) -> Self {
        Self { contests, submissions }
    }

    /// Caller is enrolled and the problem belongs to the contest
    pub async fn ensure_eligible(
        &self,
        contest_id: Uuid,
        user_id: Uuid,
        problem_id: Uuid,
    ) -> AppResult<Contest> {
        let contest = self
            .contests
            .find_contest(contest_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Contest not found".to_string()))?;

        let enrolled = self
            .contests
            .enrollment_status(contest_id, user_id)
            .await?
            .is_some_and(|status| status == ENROLLMENT_ENROLLED);
        if !enrolled {
            return Err(AppError::BadRequest("Not enrolled in this contest".to_string()));
        }

        if !self.contests.contains_problem(contest_id, problem_id).await? {
            return Err(AppError::BadRequest("Problem is not part of this contest".to_string()));
        }

        Ok(contest)
    }

    /// Judge a code submission inside a contest
    pub async fn submit(
        &self,
        contest_id: Uuid,
        user_id: Uuid,
        payload: CreateContestSubmissionRequest,
    ) -> AppResult<ContestSubmissionDetail> {
        self.ensure_eligible(contest_id, user_id, payload.problem_id).await?;

        let service = self.clone();
        tokio::spawn(async move {
            let detail = service
                .submissions
                .submit(user_id, payload.into_submission(contest_id))
                .await?;
            service.record_submission(contest_id, &detail.submission).await
        })
        .await
        .map_err(|e| AppError::Internal(e.into()))?
    }

    /// Grade a multiple-choice attempt inside a contest
    pub async fn submit_choice(
        &self,
        contest_id: Uuid,
        user_id: Uuid,
        payload: CreateContestChoiceRequest,
    ) -> AppResult<ContestSubmissionDetail> {
        self.ensure_eligible(contest_id, user_id, payload.problem_id).await?;

        let service = self.clone();
        tokio::spawn(async move {
            let detail = service
                .submissions
                .submit_choice(user_id, payload.into_submission(contest_id))
                .await?;
            service.record_submission(contest_id, &detail.submission).await
        })
        .await
        .map_err(|e| AppError::Internal(e.into()))?
    }

    /// Append a finished submission to the contest log. Eligibility is
    /// settled before judging starts and is not checked again here. The
    /// accepted counter is bumped only when this attempt wins the
    /// first-accept claim.
    pub async fn record_submission(
        &self,
        contest_id: Uuid,
        submission: &Submission,
    ) -> AppResult<ContestSubmissionDetail> {
        let student_id = submission.user_id;
        let problem_id = submission.problem_id;

        let accepted = submission.status.is_accepted();
        let candidate = accepted
            && !self
                .contests
                .has_accepted(contest_id, student_id, problem_id)
                .await?;

        let row = self
            .contests
            .insert_submission(&NewContestSubmission {
                contest_id,
                submission_id: submission.id,
                student_id,
                problem_id,
                code: submission.source_code.clone(),
                language: submission.language.clone(),
                status: submission.status,
                score: submission.score,
                execution_time_ms: submission.execution_time_ms,
                memory_used_mb: submission.memory_used_mb,
                test_cases_passed: submission.test_cases_passed,
                total_test_cases: submission.total_test_cases,
                submitted_at: submission.submitted_at,
                solved_at: accepted.then(|| submission.judged_at.unwrap_or_else(Utc::now)),
            })
            .await?;

        let first_accepted = candidate
            && self
                .contests
                .claim_first_accept(contest_id, student_id, problem_id, submission.id)
                .await?;

        if first_accepted {
            tracing::info!(
                contest_id = %contest_id,
                student_id = %student_id,
                problem_id = %problem_id,
                submission_id = %submission.id,
                "First accepted solution recorded"
            );
        }

        let names = self
            .contests
            .submission_names(contest_id, student_id, problem_id)
            .await?;

        Ok(ContestSubmissionDetail {
            contest_submission: row,
            names,
            first_accepted,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::JudgeConfig;
    use crate::constants::LEGACY_UNIQUE_CONFLICT;
    use crate::handlers::contests::request::CreateContestSubmissionRequest;
    use crate::judge::{
        status, EngineStatus, MockExecutionEngine, MockNodeDirectory, PollPolicy, RawResult,
    };
    use crate::models::SubmissionState;
    use crate::services::submission_service::JudgeSettings;
    use crate::test_utils::{
        node, problem, test_case, wait_until, InMemoryStore, RecordingProgress,
    };
    use std::time::Duration;

    struct Fixture {
        store: Arc<InMemoryStore>,
        service: ContestService,
        contest_id: Uuid,
        student_id: Uuid,
        problem_id: Uuid,
        code_problem_id: Uuid,
    }

    impl Fixture {
        /// Contest service judging code on a single mocked node
        fn with_judge(&self, engine: MockExecutionEngine, poll: PollPolicy) -> ContestService {
            let judge_node = node("judge-1", 0, 4);
            let mut nodes = MockNodeDirectory::new();
            nodes.expect_select_best().returning(move || Ok(judge_node.clone()));
            nodes.expect_increment_load().times(1).returning(|_| Ok(()));
            nodes.expect_decrement_load().times(1).returning(|_| Ok(()));

            let submissions = Arc::new(SubmissionService::new(
                self.store.clone(),
                self.store.clone(),
                Arc::new(nodes),
                Arc::new(engine),
                Arc::new(RecordingProgress::default()),
                JudgeSettings {
                    poll,
                    liveness_probe: false,
                },
            ));
            ContestService::new(self.store.clone(), submissions)
        }

        fn code_request(&self) -> CreateContestSubmissionRequest {
            CreateContestSubmissionRequest {
                problem_id: self.code_problem_id,
                language: "python".into(),
                source_code: "print(input())".into(),
            }
        }
    }

    fn engine_result(status_id: i32) -> RawResult {
        RawResult {
            status: EngineStatus {
                id: status_id,
                description: String::new(),
            },
            time: Some(0.01),
            memory: Some(1024.0),
            ..Default::default()
        }
    }

    fn fixture() -> Fixture {
        let store = Arc::new(InMemoryStore::default());
        let student_id = store.add_user("carol");

        let mut quiz = problem("Quiz");
        quiz.choice_answers = Some(vec!["B".into()]);
        let problem_id = quiz.id;
        store.add_problem(quiz, Vec::new());

        let echo = problem("Echo");
        let code_problem_id = echo.id;
        store.add_problem(echo.clone(), vec![test_case(&echo, 0)]);

        let contest_id = store.add_contest("Weekly Round", &[problem_id, code_problem_id]);
        store.enroll(contest_id, student_id, ENROLLMENT_ENROLLED);

        let submissions = Arc::new(SubmissionService::new(
            store.clone(),
            store.clone(),
            Arc::new(MockNodeDirectory::new()),
            Arc::new(MockExecutionEngine::new()),
            Arc::new(RecordingProgress::default()),
            JudgeSettings::from(&JudgeConfig::default()),
        ));
        let service = ContestService::new(store.clone(), submissions);

        Fixture {
            store,
            service,
            contest_id,
            student_id,
            problem_id,
            code_problem_id,
        }
    }

    fn finished(student_id: Uuid, problem_id: Uuid, status: SubmissionState) -> Submission {
        Submission {
            id: Uuid::now_v7(),
            user_id: student_id,
            problem_id,
            context_id: None,
            judge_node_id: None,
            source_code: "print(42)".into(),
            language: "python".into(),
            status,
            score: Some(if status.is_accepted() { 100.0 } else { 0.0 }),
            execution_time_ms: Some(10.0),
            memory_used_mb: Some(1.5),
            test_cases_passed: if status.is_accepted() { 1 } else { 0 },
            total_test_cases: 1,
            error_message: None,
            judge_token: Some("tok".into()),
            submitted_at: Utc::now(),
            judged_at: Some(Utc::now()),
        }
    }

    #[tokio::test]
    async fn test_first_accept_increments_once() {
        let f = fixture();

        let wrong = finished(f.student_id, f.problem_id, SubmissionState::WrongAnswer);
        let result = f.service.record_submission(f.contest_id, &wrong).await.unwrap();
        assert!(!result.first_accepted);
        assert!(result.contest_submission.solved_at.is_none());
        assert_eq!(f.store.accepted_count(f.contest_id, f.student_id), 0);

        let first = finished(f.student_id, f.problem_id, SubmissionState::Accepted);
        let result = f.service.record_submission(f.contest_id, &first).await.unwrap();
        assert!(result.first_accepted);
        assert!(result.contest_submission.solved_at.is_some());
        assert_eq!(result.names.contest_title, "Weekly Round");
        assert_eq!(result.names.username, "carol");
        assert_eq!(f.store.accepted_count(f.contest_id, f.student_id), 1);

        let again = finished(f.student_id, f.problem_id, SubmissionState::Accepted);
        let result = f.service.record_submission(f.contest_id, &again).await.unwrap();
        assert!(!result.first_accepted);
        assert_eq!(f.store.accepted_count(f.contest_id, f.student_id), 1);

        // every attempt is logged
        assert_eq!(f.store.contest_submission_count(), 3);
    }

    #[tokio::test]
    async fn test_concurrent_accepts_increment_once() {
        let f = fixture();
        let a = finished(f.student_id, f.problem_id, SubmissionState::Accepted);
        let b = finished(f.student_id, f.problem_id, SubmissionState::Accepted);

        let (ra, rb) = tokio::join!(
            f.service.record_submission(f.contest_id, &a),
            f.service.record_submission(f.contest_id, &b)
        );

        let winners = [ra.unwrap().first_accepted, rb.unwrap().first_accepted]
            .into_iter()
            .filter(|won| *won)
            .count();
        assert_eq!(winners, 1);
        assert_eq!(f.store.accepted_count(f.contest_id, f.student_id), 1);
    }

    #[tokio::test]
    async fn test_lost_claim_does_not_increment() {
        let f = fixture();
        // A concurrent request already claimed the marker but its log row
        // is not visible yet
        assert!(f
            .store
            .claim_first_accept(f.contest_id, f.student_id, f.problem_id, Uuid::now_v7())
            .await
            .unwrap());

        let late = finished(f.student_id, f.problem_id, SubmissionState::Accepted);
        let result = f.service.record_submission(f.contest_id, &late).await.unwrap();

        assert!(!result.first_accepted);
        assert_eq!(f.store.accepted_count(f.contest_id, f.student_id), 1);
        assert_eq!(f.store.contest_submission_count(), 1);
    }

    #[tokio::test]
    async fn test_eligibility() {
        let f = fixture();

        let err = f
            .service
            .ensure_eligible(Uuid::new_v4(), f.student_id, f.problem_id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let outsider = f.store.add_user("dave");
        let err = f
            .service
            .ensure_eligible(f.contest_id, outsider, f.problem_id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        let withdrawn = f.store.add_user("erin");
        f.store.enroll(f.contest_id, withdrawn, "withdrawn");
        let err = f
            .service
            .ensure_eligible(f.contest_id, withdrawn, f.problem_id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        let err = f
            .service
            .ensure_eligible(f.contest_id, f.student_id, Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        let contest = f
            .service
            .ensure_eligible(f.contest_id, f.student_id, f.problem_id)
            .await
            .unwrap();
        assert_eq!(contest.id, f.contest_id);
    }

    #[tokio::test]
    async fn test_ineligible_contest_submission_consumes_nothing() {
        let f = fixture();
        let outsider = f.store.add_user("frank");

        let err = f
            .service
            .submit_choice(
                f.contest_id,
                outsider,
                CreateContestChoiceRequest {
                    problem_id: f.problem_id,
                    answers: vec!["B".into()],
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::BadRequest(_)));
        assert_eq!(f.store.submission_count(), 0);
        assert_eq!(f.store.contest_submission_count(), 0);
    }

    #[tokio::test]
    async fn test_contest_choice_submission_end_to_end() {
        let f = fixture();

        let result = f
            .service
            .submit_choice(
                f.contest_id,
                f.student_id,
                CreateContestChoiceRequest {
                    problem_id: f.problem_id,
                    answers: vec!["b".into()],
                },
            )
            .await
            .unwrap();

        assert!(result.first_accepted);
        assert_eq!(result.contest_submission.status, SubmissionState::Accepted);
        assert_eq!(result.contest_submission.contest_id, f.contest_id);
        assert_eq!(f.store.accepted_count(f.contest_id, f.student_id), 1);
        assert_eq!(f.store.only_submission().context_id, Some(f.contest_id));
    }

    #[tokio::test]
    async fn test_legacy_unique_constraint_surfaces_as_conflict() {
        let f = fixture();
        f.store.keep_legacy_unique_constraint();

        let wrong = finished(f.student_id, f.problem_id, SubmissionState::WrongAnswer);
        f.service.record_submission(f.contest_id, &wrong).await.unwrap();

        let accepted = finished(f.student_id, f.problem_id, SubmissionState::Accepted);
        let err = f
            .service
            .record_submission(f.contest_id, &accepted)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            AppError::Conflict(ref message) if message == LEGACY_UNIQUE_CONFLICT
        ));
        assert!(err.to_string().contains("drop it"));
        assert_eq!(f.store.accepted_count(f.contest_id, f.student_id), 0);
        assert_eq!(f.store.contest_submission_count(), 1);
    }

    #[tokio::test]
    async fn test_withdrawal_during_judging_still_logs_attempt() {
        let f = fixture();
        let store = f.store.clone();
        let (contest_id, student_id) = (f.contest_id, f.student_id);

        let mut engine = MockExecutionEngine::new();
        engine.expect_dispatch().returning(move |_, _| {
            store.enroll(contest_id, student_id, "withdrawn");
            Ok("tok-0".to_string())
        });
        engine
            .expect_fetch_result()
            .returning(|_, _| Ok(engine_result(status::ACCEPTED)));
        let poll = PollPolicy {
            max_attempts: 3,
            interval: Duration::from_millis(1),
        };
        let service = f.with_judge(engine, poll);

        let result = service
            .submit(contest_id, student_id, f.code_request())
            .await
            .unwrap();

        assert!(result.first_accepted);
        assert_eq!(result.contest_submission.status, SubmissionState::Accepted);
        assert_eq!(f.store.contest_submission_count(), 1);
    }

    #[tokio::test]
    async fn test_dropped_contest_request_still_logs_attempt() {
        let f = fixture();
        let mut engine = MockExecutionEngine::new();
        engine.expect_dispatch().returning(|_, _| Ok("tok-0".to_string()));
        engine
            .expect_fetch_result()
            .returning(|_, _| Ok(engine_result(status::PROCESSING)));
        let poll = PollPolicy {
            max_attempts: 5,
            interval: Duration::from_millis(10),
        };
        let service = f.with_judge(engine, poll);

        let abandoned = tokio::time::timeout(
            Duration::from_millis(15),
            service.submit(f.contest_id, f.student_id, f.code_request()),
        )
        .await;
        assert!(abandoned.is_err());

        let store = f.store.clone();
        wait_until(move || store.contest_submission_count() == 1).await;

        let stored = f.store.only_submission();
        assert_eq!(stored.status, SubmissionState::InternalError);
        assert_eq!(stored.context_id, Some(f.contest_id));
        assert_eq!(f.store.accepted_count(f.contest_id, f.student_id), 0);
    }
}
