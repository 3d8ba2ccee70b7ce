//! Host-side session management.
//!
//! - [`JoinRequestBoard`]: pending requests and approved members of a session
//! - [`ManageFlow`]: attendance check, then member evaluation
//! - [`HostEvaluationDraft`]: a participant's rating of the host

use log::{info, warn};

use crate::api::{ManageApi, MyPageApi};
use crate::error::{OptionExt, Result, RunmateError};
use crate::types::{
    AttendanceMember, AttendanceStatus, CreatedRunning, EvaluationMember, EvaluationRequest,
    EvaluationScore, JoinStatus, Participant, SessionStatus, FEEDBACK_KEYWORDS,
};

// ============================================================================
// Join requests
// ============================================================================

/// Requests and members for one hosted session.
#[derive(Debug)]
pub struct JoinRequestBoard<A> {
    api: A,
    session_id: i64,
    session: Option<CreatedRunning>,
    requests: Vec<Participant>,
    members: Vec<Participant>,
}

impl<A: ManageApi> JoinRequestBoard<A> {
    pub fn new(api: A, session_id: i64) -> Self {
        Self {
            api,
            session_id,
            session: None,
            requests: Vec::new(),
            members: Vec::new(),
        }
    }

    /// Load session, requests and members. Returns true when the run is
    /// already finished and the host belongs on the evaluation step.
    pub async fn load(&mut self) -> Result<bool> {
        let session = self.api.get_managed_session(self.session_id).await?;
        self.requests = self
            .api
            .get_participants(self.session_id, JoinStatus::Requested)
            .await?;
        self.members = self
            .api
            .get_participants(self.session_id, JoinStatus::Approved)
            .await?;
        let finished = session.status == SessionStatus::Finished;
        self.session = Some(session);
        Ok(finished)
    }

    pub fn session(&self) -> Option<&CreatedRunning> {
        self.session.as_ref()
    }

    pub fn requests(&self) -> &[Participant] {
        &self.requests
    }

    pub fn members(&self) -> &[Participant] {
        &self.members
    }

    /// Approve a pending request and move it to the members.
    pub async fn approve(&mut self, participation_id: i64) -> Result<()> {
        self.api
            .approve_participant(self.session_id, participation_id)
            .await?;
        if let Some(pos) = self.requests.iter().position(|r| r.id == participation_id) {
            let mut member = self.requests.remove(pos);
            member.status = JoinStatus::Approved;
            self.members.push(member);
        }
        Ok(())
    }

    pub async fn reject(&mut self, participation_id: i64) -> Result<()> {
        self.api
            .reject_participant(self.session_id, participation_id)
            .await?;
        self.requests.retain(|r| r.id != participation_id);
        Ok(())
    }
}

// ============================================================================
// Attendance and evaluation
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManageStep {
    Attendance,
    Evaluation,
}

/// The host's post-run screen.
#[derive(Debug)]
pub struct ManageFlow<A> {
    api: A,
    session_id: i64,
    step: ManageStep,
    session: Option<CreatedRunning>,
    attendance: Vec<AttendanceMember>,
    evaluations: Vec<EvaluationMember>,
}

impl<A: ManageApi + MyPageApi> ManageFlow<A> {
    pub fn new(api: A, session_id: i64) -> Self {
        Self {
            api,
            session_id,
            step: ManageStep::Attendance,
            session: None,
            attendance: Vec::new(),
            evaluations: Vec::new(),
        }
    }

    /// Find the session among the host's runs and open the matching step.
    ///
    /// Finished runs go straight to evaluation; canceled runs are refused.
    pub async fn load(&mut self) -> Result<ManageStep> {
        let runs = self.api.get_created_runs(None).await?;
        let session = runs
            .into_iter()
            .find(|r| r.id == self.session_id)
            .ok_or_not_found("Session", self.session_id)?;

        match session.status {
            SessionStatus::Finished => {
                self.evaluations = self.api.get_evaluation_list(self.session_id).await?;
                self.step = ManageStep::Evaluation;
            }
            SessionStatus::Canceled => {
                return Err(RunmateError::Validation {
                    message: "This session was canceled.".to_string(),
                });
            }
            _ => {
                self.attendance = self.api.get_attendance_list(self.session_id).await?;
                self.step = ManageStep::Attendance;
            }
        }

        info!(
            "[ManageFlow] session {} opened at {:?}",
            self.session_id, self.step
        );
        self.session = Some(session);
        Ok(self.step)
    }

    pub fn step(&self) -> ManageStep {
        self.step
    }

    pub fn session(&self) -> Option<&CreatedRunning> {
        self.session.as_ref()
    }

    pub fn attendance(&self) -> &[AttendanceMember] {
        &self.attendance
    }

    pub fn evaluations(&self) -> &[EvaluationMember] {
        &self.evaluations
    }

    /// Mark one member. The list changes before the backend answers and is
    /// restored if the call fails.
    pub async fn update_attendance(
        &mut self,
        participation_id: i64,
        status: AttendanceStatus,
    ) -> Result<()> {
        let member = self
            .attendance
            .iter_mut()
            .find(|m| m.id == participation_id)
            .ok_or_not_found("Participant", participation_id)?;
        let previous = member.attendance_status;
        member.attendance_status = status;

        let result = self
            .api
            .update_attendance(self.session_id, participation_id, status)
            .await;

        if let Err(e) = &result {
            warn!(
                "[ManageFlow] attendance for {} failed, reverting: {}",
                participation_id, e
            );
            if let Some(member) = self.attendance.iter_mut().find(|m| m.id == participation_id) {
                member.attendance_status = previous;
            }
        }
        result
    }

    /// Close attendance, start the run and move on to evaluation.
    pub async fn finish_attendance(&mut self) -> Result<()> {
        self.api.start_running_session(self.session_id).await?;
        self.evaluations = self.api.get_evaluation_list(self.session_id).await?;
        self.step = ManageStep::Evaluation;
        Ok(())
    }
}

// ============================================================================
// Host evaluation
// ============================================================================

/// Rating a participant gives the host after a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostEvaluationDraft {
    score: Option<EvaluationScore>,
    keywords: Vec<String>,
}

impl HostEvaluationDraft {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_score(&mut self, score: EvaluationScore) {
        self.score = Some(score);
    }

    pub fn score(&self) -> Option<EvaluationScore> {
        self.score
    }

    /// Toggle one of [`FEEDBACK_KEYWORDS`]. Returns true when now selected;
    /// unknown keywords are ignored.
    pub fn toggle_keyword(&mut self, keyword: &str) -> bool {
        if !FEEDBACK_KEYWORDS.contains(&keyword) {
            return false;
        }
        if let Some(pos) = self.keywords.iter().position(|k| k == keyword) {
            self.keywords.remove(pos);
            false
        } else {
            self.keywords.push(keyword.to_string());
            true
        }
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn can_submit(&self) -> bool {
        self.score.is_some()
    }

    /// Request body, once a score is chosen.
    pub fn to_request(&self, session_id: i64) -> Option<EvaluationRequest> {
        self.score.map(|score| EvaluationRequest {
            session_id,
            score,
            feedback_keywords: self.keywords.clone(),
        })
    }

    pub async fn submit<A: ManageApi>(&self, api: &A, session_id: i64) -> Result<()> {
        let request = self.to_request(session_id).ok_or_else(|| RunmateError::Validation {
            message: "Choose a rating first.".to_string(),
        })?;
        api.submit_host_evaluation(&request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MockBackend;

    #[tokio::test]
    async fn test_board_approve_and_reject() {
        let mut board = JoinRequestBoard::new(MockBackend::new(), 1);
        assert!(!board.load().await.unwrap());
        assert_eq!(board.requests().len(), 2);
        assert_eq!(board.members().len(), 1);

        let first = board.requests()[0].id;
        let second = board.requests()[1].id;
        board.approve(first).await.unwrap();
        board.reject(second).await.unwrap();

        assert!(board.requests().is_empty());
        assert_eq!(board.members().len(), 2);
        assert!(board.members().iter().all(|m| m.status == JoinStatus::Approved));
    }

    #[tokio::test]
    async fn test_finished_session_opens_evaluation() {
        let mut flow = ManageFlow::new(MockBackend::new(), 2);
        assert_eq!(flow.load().await.unwrap(), ManageStep::Evaluation);
        assert_eq!(flow.evaluations().len(), 3);
    }

    #[tokio::test]
    async fn test_attendance_then_finish() {
        let mock = MockBackend::new();
        let mut flow = ManageFlow::new(mock.clone(), 1);
        assert_eq!(flow.load().await.unwrap(), ManageStep::Attendance);

        let id = flow.attendance()[0].id;
        flow.update_attendance(id, AttendanceStatus::Attended)
            .await
            .unwrap();
        assert_eq!(
            flow.attendance()[0].attendance_status,
            AttendanceStatus::Attended
        );

        flow.finish_attendance().await.unwrap();
        assert_eq!(flow.step(), ManageStep::Evaluation);

        // The run is now finished for the host as well
        let mut again = ManageFlow::new(mock, 1);
        assert_eq!(again.load().await.unwrap(), ManageStep::Evaluation);
    }

    #[tokio::test]
    async fn test_unknown_session() {
        let mut flow = ManageFlow::new(MockBackend::new(), 42);
        assert!(matches!(
            flow.load().await,
            Err(RunmateError::NotFound { id: 42, .. })
        ));
    }

    #[tokio::test]
    async fn test_unknown_participant_is_rejected() {
        let mut flow = ManageFlow::new(MockBackend::new(), 1);
        flow.load().await.unwrap();
        assert!(flow
            .update_attendance(9999, AttendanceStatus::Absent)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_host_evaluation_draft() {
        let mut draft = HostEvaluationDraft::new();
        assert!(!draft.can_submit());
        assert!(draft.submit(&MockBackend::new(), 1).await.is_err());

        assert!(draft.toggle_keyword("Friendly"));
        assert!(!draft.toggle_keyword("Not a keyword"));
        assert!(draft.toggle_keyword("Punctual"));
        assert!(!draft.toggle_keyword("Friendly"));
        draft.set_score(EvaluationScore::Good);

        let request = draft.to_request(3).unwrap();
        assert_eq!(request.feedback_keywords, vec!["Punctual".to_string()]);

        let mock = MockBackend::new();
        draft.submit(&mock, 3).await.unwrap();
        assert_eq!(mock.submitted_evaluations().len(), 1);
    }
}
