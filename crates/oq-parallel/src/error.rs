use thiserror::Error;

#[derive(Debug, Error)]
pub enum TaskError {
    #[error("task '{task}' failed: {message}")]
    TaskFailed { task: String, message: String },

    #[error("out of memory: RSS at {used_pct:.1}% exceeds hard threshold {hard_pct:.1}%")]
    OutOfMemory { used_pct: f64, hard_pct: f64 },
}

pub type TaskResult<T> = Result<T, TaskError>;
