//! Scripted in-memory stand-ins for the occupancy service and the writer.

use crate::core::error::{ServiceError, WriteError};
use crate::core::models::{DataPoint, Destination, OccupancyRecord, PollOutcome};
use crate::service::{OccupancyService, Session};
use crate::sink::PointWriter;
use async_trait::async_trait;
use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
pub struct SeenPoll {
    pub token: String,
    pub cookies: BTreeMap<String, String>,
}

#[derive(Default)]
pub struct ScriptedService {
    outcomes: Mutex<VecDeque<Result<PollOutcome, ServiceError>>>,
    fail_auth_on: Option<usize>,
    auth_calls: Mutex<usize>,
    polls: Mutex<Vec<SeenPoll>>,
}

impl ScriptedService {
    pub fn new(outcomes: Vec<Result<PollOutcome, ServiceError>>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into()),
            ..Self::default()
        }
    }

    /// Makes the n-th call to `authenticate` (1-based) fail with a 500.
    pub fn failing_auth_on(mut self, call: usize) -> Self {
        self.fail_auth_on = Some(call);
        self
    }

    pub fn auth_calls(&self) -> usize {
        *self.auth_calls.lock().unwrap()
    }

    pub fn polls(&self) -> Vec<SeenPoll> {
        self.polls.lock().unwrap().clone()
    }
}

#[async_trait]
impl OccupancyService for ScriptedService {
    async fn authenticate(&self) -> Result<Session, ServiceError> {
        let call = {
            let mut calls = self.auth_calls.lock().unwrap();
            *calls += 1;
            *calls
        };

        if self.fail_auth_on == Some(call) {
            return Err(ServiceError::AuthFailure { status_code: 500 });
        }

        Ok(Session::new(
            format!("token-{}", call),
            vec![("generation".to_string(), call.to_string())],
        ))
    }

    async fn poll(&self, session: &Session) -> Result<PollOutcome, ServiceError> {
        self.polls.lock().unwrap().push(SeenPoll {
            token: session.token().to_string(),
            cookies: session.cookies().clone(),
        });

        self.outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(PollOutcome::Failure { status_code: 500 }))
    }
}

#[derive(Default)]
pub struct WriterState {
    pub batches: Vec<Vec<DataPoint>>,
    pub destinations: Vec<Destination>,
    pub closed: usize,
}

#[derive(Clone, Default)]
pub struct RecordingWriter {
    pub state: Arc<Mutex<WriterState>>,
    fail_writes: bool,
}

impl RecordingWriter {
    pub fn failing() -> Self {
        Self {
            fail_writes: true,
            ..Self::default()
        }
    }

    pub fn batches(&self) -> usize {
        self.state.lock().unwrap().batches.len()
    }

    pub fn closed(&self) -> usize {
        self.state.lock().unwrap().closed
    }
}

#[async_trait]
impl PointWriter for RecordingWriter {
    async fn write(
        &self,
        destination: &Destination,
        points: &[DataPoint],
    ) -> Result<(), WriteError> {
        if self.fail_writes {
            return Err(WriteError::Rejected {
                status_code: 503,
                body: "unavailable".to_string(),
            });
        }

        let mut state = self.state.lock().unwrap();
        state.batches.push(points.to_vec());
        state.destinations.push(destination.clone());
        Ok(())
    }

    async fn close(&mut self) -> Result<(), WriteError> {
        self.state.lock().unwrap().closed += 1;
        Ok(())
    }
}

pub fn success(cookies: &[(&str, &str)]) -> Result<PollOutcome, ServiceError> {
    Ok(PollOutcome::Success {
        records: vec![OccupancyRecord {
            facility_id: 1,
            facility_name: "CIRCUITO TERMAL".to_string(),
            occupancy: 10,
            entries: 5,
            exits: 2,
            capacity: 50,
        }],
        cookies: cookies
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
    })
}

pub fn decode_fault() -> Result<PollOutcome, ServiceError> {
    let err = serde_json::from_str::<Vec<OccupancyRecord>>("<html>").unwrap_err();
    Err(ServiceError::Decode(err))
}
