//! The pivot backend as seen from the chart: requests go out, results come back later.

use crate::error::QueryError;
use crate::request::PivotRequest;
use crate::tensor::PivotResponse;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

pub type QueryResult = Result<PivotResponse, QueryError>;

pub trait PivotQueryService {
    /// Sends a request. Its result is later returned by `try_next`.
    fn execute(&mut self, request: PivotRequest);
    /// Next available result, in arrival order.
    fn try_next(&mut self) -> Option<QueryResult>;
    fn has_in_flight(&self) -> bool;
}

#[derive(Debug, Default)]
struct ChannelState {
    requests: VecDeque<PivotRequest>,
    results: VecDeque<QueryResult>,
    in_flight: usize,
}

/// Chart side of an in-memory query channel.
#[derive(Clone, Debug, Default)]
pub struct QueryChannel {
    state: Arc<Mutex<ChannelState>>,
}

/// Backend side of a [`QueryChannel`]: takes requests, answers in any order.
#[derive(Clone, Debug)]
pub struct QueryBackend {
    state: Arc<Mutex<ChannelState>>,
}

impl QueryChannel {
    pub fn new() -> (Self, QueryBackend) {
        let channel = Self::default();
        let backend = QueryBackend {
            state: channel.state.clone(),
        };
        (channel, backend)
    }
}

impl PivotQueryService for QueryChannel {
    fn execute(&mut self, request: PivotRequest) {
        let mut state = self.state.lock();
        state.in_flight += 1;
        state.requests.push_back(request);
    }

    fn try_next(&mut self) -> Option<QueryResult> {
        self.state.lock().results.pop_front()
    }

    fn has_in_flight(&self) -> bool {
        self.state.lock().in_flight > 0
    }
}

impl QueryBackend {
    pub fn next_request(&self) -> Option<PivotRequest> {
        self.state.lock().requests.pop_front()
    }

    pub fn pending_requests(&self) -> usize {
        self.state.lock().requests.len()
    }

    pub fn respond(&self, result: QueryResult) {
        let mut state = self.state.lock();
        state.in_flight = state.in_flight.saturating_sub(1);
        state.results.push_back(result);
    }
}
