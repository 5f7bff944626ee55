use std::sync::Arc;

use crate::service::EvaluationService;

#[derive(Clone)]
pub struct HandlerState {
    pub service: Arc<EvaluationService>,
}

impl HandlerState {
    pub fn new(service: Arc<EvaluationService>) -> Self {
        Self { service }
    }
}
