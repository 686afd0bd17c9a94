pub mod course_ctx;
pub mod course_flow;
pub mod events;

pub use course_ctx::CourseCtx;
pub use course_flow::CourseFlow;
pub use events::{RunEvent, RunObserver, TracingObserver};
