//! In-memory stores and fixtures for service tests

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::{
    constants::LEGACY_UNIQUE_CONFLICT,
    db::{ContestStore, ProblemCatalog, SubmissionStore},
    error::{AppError, AppResult},
    models::{
        Contest, ContestSubmission, ContestSubmissionNames, Finalization, JudgeNode,
        NewContestSubmission, NewSubmission, Problem, ProgressUpdate, Submission, SubmissionDetail,
        TestCase,
    },
    services::ProgressTracker,
};

pub fn node(name: &str, load: i32, capacity: i32) -> JudgeNode {
    JudgeNode {
        id: Uuid::new_v4(),
        name: name.to_string(),
        base_url: format!("http://{name}:2358"),
        current_load: load,
        max_capacity: capacity,
        is_online: true,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub fn problem(title: &str) -> Problem {
    Problem {
        id: Uuid::new_v4(),
        title: title.to_string(),
        time_limit_ms: 2000,
        memory_limit_kb: 262144,
        choice_answers: None,
    }
}

/// Test case `index` with input `input-{index}`
pub fn test_case(problem: &Problem, index: usize) -> TestCase {
    TestCase {
        id: Uuid::new_v4(),
        problem_id: problem.id,
        input: format!("input-{index}"),
        expected_output: format!("output-{index}"),
        order: index as i32,
    }
}

/// Poll `condition` until it holds, yielding to spawned tasks in between
pub async fn wait_until(condition: impl Fn() -> bool) {
    for _ in 0..200 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
    panic!("condition not reached");
}

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, String>,
    problems: HashMap<Uuid, Problem>,
    test_cases: HashMap<Uuid, Vec<TestCase>>,
    submissions: HashMap<Uuid, Submission>,
    contests: HashMap<Uuid, Contest>,
    contest_problems: HashSet<(Uuid, Uuid)>,
    enrollments: HashMap<(Uuid, Uuid), (String, i32)>,
    contest_submissions: Vec<ContestSubmission>,
    first_accepts: HashMap<(Uuid, Uuid, Uuid), Uuid>,
    legacy_unique_constraint: bool,
}

/// Single in-memory database backing every store trait
#[derive(Default)]
pub struct InMemoryStore {
    tables: Mutex<Tables>,
}

impl InMemoryStore {
    pub fn add_user(&self, username: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.tables.lock().unwrap().users.insert(id, username.to_string());
        id
    }

    pub fn add_problem(&self, problem: Problem, test_cases: Vec<TestCase>) {
        let mut tables = self.tables.lock().unwrap();
        tables.test_cases.insert(problem.id, test_cases);
        tables.problems.insert(problem.id, problem);
    }

    pub fn add_contest(&self, title: &str, problems: &[Uuid]) -> Uuid {
        let id = Uuid::new_v4();
        let mut tables = self.tables.lock().unwrap();
        tables.contests.insert(
            id,
            Contest {
                id,
                title: title.to_string(),
                start_time: Utc::now(),
                end_time: Utc::now() + chrono::Duration::hours(2),
            },
        );
        for problem_id in problems {
            tables.contest_problems.insert((id, *problem_id));
        }
        id
    }

    pub fn enroll(&self, contest_id: Uuid, user_id: Uuid, status: &str) {
        self.tables
            .lock()
            .unwrap()
            .enrollments
            .insert((contest_id, user_id), (status.to_string(), 0));
    }

    /// Reject a second log row for the same (contest, student, problem)
    pub fn keep_legacy_unique_constraint(&self) {
        self.tables.lock().unwrap().legacy_unique_constraint = true;
    }

    pub fn accepted_count(&self, contest_id: Uuid, user_id: Uuid) -> i32 {
        self.tables
            .lock()
            .unwrap()
            .enrollments
            .get(&(contest_id, user_id))
            .map(|(_, count)| *count)
            .unwrap_or_default()
    }

    pub fn contest_submission_count(&self) -> usize {
        self.tables.lock().unwrap().contest_submissions.len()
    }

    pub fn submission_count(&self) -> usize {
        self.tables.lock().unwrap().submissions.len()
    }

    pub fn only_submission(&self) -> Submission {
        let tables = self.tables.lock().unwrap();
        assert_eq!(tables.submissions.len(), 1);
        tables.submissions.values().next().cloned().unwrap()
    }
}

#[async_trait]
impl SubmissionStore for InMemoryStore {
    async fn create(&self, new: &NewSubmission) -> AppResult<Submission> {
        let submission = Submission {
            id: new.id,
            user_id: new.user_id,
            problem_id: new.problem_id,
            context_id: new.context_id,
            judge_node_id: new.judge_node_id,
            source_code: new.source_code.clone(),
            language: new.language.clone(),
            status: crate::models::SubmissionState::Pending,
            score: None,
            execution_time_ms: None,
            memory_used_mb: None,
            test_cases_passed: 0,
            total_test_cases: 0,
            error_message: None,
            judge_token: None,
            submitted_at: Utc::now(),
            judged_at: None,
        };
        let mut tables = self.tables.lock().unwrap();
        if tables.submissions.contains_key(&new.id) {
            return Err(AppError::Conflict("Resource already exists".into()));
        }
        tables.submissions.insert(new.id, submission.clone());
        Ok(submission)
    }

    async fn mark_running(&self, id: Uuid, token: &str) -> AppResult<()> {
        let mut tables = self.tables.lock().unwrap();
        if let Some(submission) = tables.submissions.get_mut(&id) {
            if !submission.status.is_terminal() {
                submission.status = crate::models::SubmissionState::Running;
                submission.judge_token = Some(token.to_string());
            }
        }
        Ok(())
    }

    async fn finalize(&self, id: Uuid, result: &Finalization) -> AppResult<Submission> {
        let mut tables = self.tables.lock().unwrap();
        let submission = tables
            .submissions
            .get_mut(&id)
            .filter(|s| !s.status.is_terminal())
            .ok_or_else(|| AppError::Conflict("Submission is already final".into()))?;

        submission.status = result.status;
        submission.score = result.score;
        submission.execution_time_ms = result.execution_time_ms;
        submission.memory_used_mb = result.memory_used_mb;
        submission.test_cases_passed = result.test_cases_passed;
        submission.total_test_cases = result.total_test_cases;
        submission.error_message = result.error_message.clone();
        if result.judge_token.is_some() {
            submission.judge_token = result.judge_token.clone();
        }
        submission.judged_at = Some(Utc::now());
        Ok(submission.clone())
    }

    async fn find_detail(&self, id: Uuid) -> AppResult<Option<SubmissionDetail>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.submissions.get(&id).map(|submission| SubmissionDetail {
            username: tables.users.get(&submission.user_id).cloned().unwrap_or_default(),
            problem_title: tables
                .problems
                .get(&submission.problem_id)
                .map(|p| p.title.clone())
                .unwrap_or_default(),
            submission: submission.clone(),
        }))
    }
}

#[async_trait]
impl ProblemCatalog for InMemoryStore {
    async fn find_problem(&self, id: Uuid) -> AppResult<Option<Problem>> {
        Ok(self.tables.lock().unwrap().problems.get(&id).cloned())
    }

    async fn test_cases(&self, problem_id: Uuid) -> AppResult<Vec<TestCase>> {
        let mut cases = self
            .tables
            .lock()
            .unwrap()
            .test_cases
            .get(&problem_id)
            .cloned()
            .unwrap_or_default();
        cases.sort_by_key(|c| c.order);
        Ok(cases)
    }
}

#[async_trait]
impl ContestStore for InMemoryStore {
    async fn find_contest(&self, id: Uuid) -> AppResult<Option<Contest>> {
        Ok(self.tables.lock().unwrap().contests.get(&id).cloned())
    }

    async fn enrollment_status(
        &self,
        contest_id: Uuid,
        user_id: Uuid,
    ) -> AppResult<Option<String>> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .enrollments
            .get(&(contest_id, user_id))
            .map(|(status, _)| status.clone()))
    }

    async fn contains_problem(&self, contest_id: Uuid, problem_id: Uuid) -> AppResult<bool> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .contest_problems
            .contains(&(contest_id, problem_id)))
    }

    async fn has_accepted(
        &self,
        contest_id: Uuid,
        student_id: Uuid,
        problem_id: Uuid,
    ) -> AppResult<bool> {
        Ok(self.tables.lock().unwrap().contest_submissions.iter().any(|row| {
            row.contest_id == contest_id
                && row.student_id == student_id
                && row.problem_id == problem_id
                && row.status.is_accepted()
        }))
    }

    async fn insert_submission(&self, new: &NewContestSubmission) -> AppResult<ContestSubmission> {
        let row = ContestSubmission {
            id: Uuid::new_v4(),
            contest_id: new.contest_id,
            submission_id: new.submission_id,
            student_id: new.student_id,
            problem_id: new.problem_id,
            code: new.code.clone(),
            language: new.language.clone(),
            status: new.status,
            score: new.score,
            execution_time_ms: new.execution_time_ms,
            memory_used_mb: new.memory_used_mb,
            test_cases_passed: new.test_cases_passed,
            total_test_cases: new.total_test_cases,
            submitted_at: new.submitted_at,
            solved_at: new.solved_at,
        };
        let mut tables = self.tables.lock().unwrap();
        let duplicate = tables.contest_submissions.iter().any(|existing| {
            existing.contest_id == new.contest_id
                && existing.student_id == new.student_id
                && existing.problem_id == new.problem_id
        });
        if tables.legacy_unique_constraint && duplicate {
            return Err(AppError::Conflict(LEGACY_UNIQUE_CONFLICT.to_string()));
        }
        tables.contest_submissions.push(row.clone());
        Ok(row)
    }

    async fn claim_first_accept(
        &self,
        contest_id: Uuid,
        student_id: Uuid,
        problem_id: Uuid,
        submission_id: Uuid,
    ) -> AppResult<bool> {
        let mut tables = self.tables.lock().unwrap();
        let key = (contest_id, student_id, problem_id);
        if tables.first_accepts.contains_key(&key) {
            return Ok(false);
        }
        tables.first_accepts.insert(key, submission_id);
        if let Some((_, count)) = tables.enrollments.get_mut(&(contest_id, student_id)) {
            *count += 1;
        }
        Ok(true)
    }

    async fn submission_names(
        &self,
        contest_id: Uuid,
        student_id: Uuid,
        problem_id: Uuid,
    ) -> AppResult<ContestSubmissionNames> {
        let tables = self.tables.lock().unwrap();
        Ok(ContestSubmissionNames {
            username: tables.users.get(&student_id).cloned().unwrap_or_default(),
            problem_title: tables
                .problems
                .get(&problem_id)
                .map(|p| p.title.clone())
                .unwrap_or_default(),
            contest_title: tables
                .contests
                .get(&contest_id)
                .map(|c| c.title.clone())
                .unwrap_or_default(),
        })
    }
}

/// Progress tracker that remembers every update
#[derive(Default)]
pub struct RecordingProgress {
    updates: Mutex<Vec<ProgressUpdate>>,
}

impl RecordingProgress {
    pub fn updates(&self) -> Vec<ProgressUpdate> {
        self.updates.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProgressTracker for RecordingProgress {
    async fn record(&self, update: ProgressUpdate) -> AppResult<()> {
        self.updates.lock().unwrap().push(update);
        Ok(())
    }
}
