//! 课程批量处理器 - 编排层
//!
//! ## 职责
//!
//! 1. **快照**：开始时读取一次课程列表，作为主轮次的处理范围
//! 2. **主轮次**：逐门处理尚未处理的课程，状态离开 `Pending!` 或没有进展时提前结束
//! 3. **补交**：状态未到 `Completed!` 时，只对未提交成功的课程再跑若干遍，每遍缩小范围
//! 4. **遗漏**：重新读取下拉框，处理快照之外出现的课程
//! 5. **保存**：无论结果如何都写出全部处理记录
//!
//! 课程之间严格串行：页面是单个有状态文档，任何 postback 都会让其它控件失效。

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{info, warn};

use crate::config::{Config, Timings};
use crate::infrastructure::PageDriver;
use crate::models::{Course, OutcomeRecord, Pass};
use crate::services::{ConditionPoller, QuiescenceDetector, ResultSink};
use crate::workflow::{CourseCtx, CourseFlow, RunEvent, RunObserver};

/// 批量处理结果
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    /// 按处理顺序追加的全部记录（同一课程可能出现多次）
    pub records: Vec<OutcomeRecord>,
    /// 最终是否观察到 `Completed!`（仅供参考）
    pub completed: bool,
}

impl BatchOutcome {
    /// 出现过的课程数
    pub fn course_count(&self) -> usize {
        self.records
            .iter()
            .map(|r| r.value.as_str())
            .collect::<HashSet<_>>()
            .len()
    }

    /// 至少有一次提交成功的课程数
    pub fn submitted_count(&self) -> usize {
        self.records
            .iter()
            .filter(|r| r.is_submitted())
            .map(|r| r.value.as_str())
            .collect::<HashSet<_>>()
            .len()
    }

    /// 某门课程的全部记录
    pub fn records_for<'a>(&'a self, value: &'a str) -> impl Iterator<Item = &'a OutcomeRecord> {
        self.records.iter().filter(move |r| r.value == value)
    }
}

pub struct CourseBatch {
    flow: CourseFlow,
    quiescence: QuiescenceDetector,
    timings: Timings,
    max_rounds: usize,
    extra_attempts: usize,
    sample_limit: Option<usize>,
    sink: Arc<dyn ResultSink>,
    observer: Arc<dyn RunObserver>,
}

impl CourseBatch {
    pub fn new(config: &Config, sink: Arc<dyn ResultSink>, observer: Arc<dyn RunObserver>) -> Self {
        Self::with_flow(
            CourseFlow::new(config),
            config.timings.clone(),
            config.max_rounds,
            config.extra_attempts,
            sink,
            observer,
        )
        .with_sample_limit(config.sample_limit)
    }

    pub fn with_flow(
        flow: CourseFlow,
        timings: Timings,
        max_rounds: usize,
        extra_attempts: usize,
        sink: Arc<dyn ResultSink>,
        observer: Arc<dyn RunObserver>,
    ) -> Self {
        Self {
            flow,
            quiescence: QuiescenceDetector::new(ConditionPoller::new(timings.poll_interval)),
            timings,
            max_rounds,
            extra_attempts,
            sample_limit: None,
            sink,
            observer,
        }
    }

    /// 只处理前 `limit` 门课程一遍（试运行）
    pub fn with_sample_limit(mut self, limit: Option<usize>) -> Self {
        self.sample_limit = limit;
        self
    }

    pub async fn run(&self, driver: &dyn PageDriver) -> BatchOutcome {
        let form = self.flow.form();
        let courses = match form.snapshot_courses(driver).await {
            Ok(courses) => courses,
            Err(e) => {
                warn!("⚠️ 读取课程列表失败: {}", e);
                Vec::new()
            }
        };
        self.observer
            .on_event(&RunEvent::CoursesLoaded { total: courses.len() });

        if let Some(limit) = self.sample_limit {
            return self.run_sample(driver, &courses, limit).await;
        }

        let mut records = Vec::new();
        let mut processed: HashSet<String> = HashSet::new();

        // ========== 主轮次 ==========
        for round in 1..=self.max_rounds {
            let pending: Vec<&Course> = courses
                .iter()
                .filter(|c| !processed.contains(&c.value))
                .collect();
            let made_progress = !pending.is_empty();

            if made_progress {
                self.run_pass(
                    driver,
                    Pass::Round(round),
                    &pending,
                    self.timings.between_courses_idle,
                    &mut records,
                )
                .await;
                processed.extend(pending.iter().map(|c| c.value.clone()));
            }

            if form
                .wait_not_pending(driver, self.timings.status_check)
                .await
            {
                info!("✓ 评估状态已不是 Pending!，结束主轮次");
                break;
            }
            if !made_progress {
                break;
            }
        }
        self.observer.on_event(&RunEvent::StatusChecked {
            status: form.read_status(driver).await,
        });

        if !form.wait_completed(driver, self.timings.status_check).await {
            // ========== 补交 ==========
            let mut retry_set = failed_courses(&courses, &records);
            for attempt in 1..=self.extra_attempts {
                if retry_set.is_empty() {
                    break;
                }
                let pending: Vec<&Course> = retry_set.iter().collect();
                let start = records.len();
                self.run_pass(
                    driver,
                    Pass::Recovery(attempt),
                    &pending,
                    self.timings.recovery_idle,
                    &mut records,
                )
                .await;
                retry_set = failed_courses(&retry_set, &records[start..]);
            }

            // ========== 遗漏课程 ==========
            if !form.wait_completed(driver, self.timings.status_check).await {
                self.run_leftover(driver, &mut processed, &mut records).await;
            }
        }

        self.persist(&records);

        let completed = form.wait_completed(driver, self.timings.final_status).await;
        let outcome = BatchOutcome { records, completed };
        let total = outcome.course_count();
        let submitted = outcome.submitted_count();
        self.observer.on_event(&RunEvent::Finished {
            submitted,
            failed: total - submitted,
            total,
            completed,
        });
        outcome
    }

    /// 试运行：前 `limit` 门课程各处理一次
    async fn run_sample(
        &self,
        driver: &dyn PageDriver,
        courses: &[Course],
        limit: usize,
    ) -> BatchOutcome {
        let sample: Vec<&Course> = courses.iter().take(limit).collect();
        let mut records = Vec::new();
        self.run_pass(
            driver,
            Pass::Sample,
            &sample,
            self.timings.between_courses_idle,
            &mut records,
        )
        .await;
        self.persist(&records);

        let completed = self.flow.form().read_status(driver).await.is_completed();
        let outcome = BatchOutcome { records, completed };
        let submitted = outcome.submitted_count();
        self.observer.on_event(&RunEvent::Finished {
            submitted,
            failed: sample.len() - submitted,
            total: sample.len(),
            completed,
        });
        outcome
    }

    /// 重新读取下拉框，处理从未处理过的课程
    async fn run_leftover(
        &self,
        driver: &dyn PageDriver,
        processed: &mut HashSet<String>,
        records: &mut Vec<OutcomeRecord>,
    ) {
        let live = match self.flow.form().snapshot_courses(driver).await {
            Ok(live) => live,
            Err(e) => {
                warn!("⚠️ 重新读取课程列表失败: {}", e);
                return;
            }
        };
        let leftover: Vec<&Course> = live
            .iter()
            .filter(|c| !processed.contains(&c.value))
            .collect();
        if leftover.is_empty() {
            return;
        }

        info!("🔍 发现 {} 门未处理的课程", leftover.len());
        self.run_pass(
            driver,
            Pass::Leftover,
            &leftover,
            self.timings.recovery_idle,
            records,
        )
        .await;
        processed.extend(leftover.iter().map(|c| c.value.clone()));
    }

    async fn run_pass(
        &self,
        driver: &dyn PageDriver,
        pass: Pass,
        courses: &[&Course],
        idle: std::time::Duration,
        records: &mut Vec<OutcomeRecord>,
    ) {
        self.observer.on_event(&RunEvent::PassStarted {
            pass,
            pending: courses.len(),
        });

        for (index, course) in courses.iter().enumerate() {
            let ctx = CourseCtx::new(pass, index + 1, courses.len());
            self.observer.on_event(&RunEvent::CourseStarted {
                pass,
                course: (*course).clone(),
                index: ctx.index,
                total: ctx.total,
            });

            let record = self.flow.run(driver, course, &ctx).await;
            self.observer
                .on_event(&RunEvent::CourseFinished { record: record.clone() });
            records.push(record);

            self.quiescence.settle(driver, idle).await;
        }
    }

    /// 写出记录，失败只报告不中断
    fn persist(&self, records: &[OutcomeRecord]) {
        match self.sink.persist(records) {
            Ok(()) => self.observer.on_event(&RunEvent::ResultsPersisted {
                count: records.len(),
            }),
            Err(e) => self.observer.on_event(&RunEvent::PersistFailed {
                message: format!("{:#}", e),
            }),
        }
    }
}

/// `courses` 中在 `records` 里没有任何一次提交成功的课程（保持原顺序）
fn failed_courses(courses: &[Course], records: &[OutcomeRecord]) -> Vec<Course> {
    courses
        .iter()
        .filter(|c| records.iter().any(|r| r.value == c.value))
        .filter(|c| {
            !records
                .iter()
                .any(|r| r.value == c.value && r.is_submitted())
        })
        .cloned()
        .collect()
}
