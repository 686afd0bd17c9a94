//! 课程处理流程 - 流程层
//!
//! 核心职责：定义"一门课"的完整评估流程
//!
//! 流程顺序：
//! 1. 选课（校验式修改 + postback）
//! 2. 等待课程详情加载
//! 3. 设置预期成绩
//! 4. 勾选"非常同意"
//! 5. 清空评语
//! 6. 提交
//! 7. 提示未选预期成绩时修正并重新提交一次
//!
//! 每一步的失败都记录在 `OutcomeRecord` 里，不向上抛出

use tracing::{debug, info, warn};

use crate::config::{Config, Timings};
use crate::infrastructure::PageDriver;
use crate::models::{Course, EvaluationLayout, OutcomeRecord, SubmitErrorKind, EVALUATION_LOAD_TIMEOUT};
use crate::services::{
    message_requests_grade, ConditionPoller, EvaluationForm, MutatorPolicy, QuiescenceDetector,
    VerifiedMutator,
};
use crate::utils::logging::truncate_text;
use crate::utils::RetryPolicy;
use crate::workflow::course_ctx::CourseCtx;

/// 课程处理流程
///
/// - 不持有任何资源（page），每次调用传入 `PageDriver`
/// - 只依赖业务能力（services）
pub struct CourseFlow {
    form: EvaluationForm,
    course_select: VerifiedMutator,
    scoped_grade: VerifiedMutator,
    grade: VerifiedMutator,
    quiescence: QuiescenceDetector,
    timings: Timings,
    expected_grade: String,
}

impl CourseFlow {
    pub fn new(config: &Config) -> Self {
        Self::with_layout(
            EvaluationLayout::default(),
            config.timings.clone(),
            config.expected_grade.clone(),
        )
    }

    pub fn with_layout(
        layout: EvaluationLayout,
        timings: Timings,
        expected_grade: impl Into<String>,
    ) -> Self {
        let poller = ConditionPoller::new(timings.poll_interval);
        let policy = |retry: RetryPolicy, idle_timeout| MutatorPolicy {
            retry,
            locate_timeout: timings.element_wait,
            idle_timeout,
            busy_indicator: Some(layout.busy_indicator.clone()),
            busy_appear: timings.busy_appear,
            busy_vanish: timings.busy_vanish,
        };

        let course_select = VerifiedMutator::new(
            poller,
            policy(
                RetryPolicy::linear(3, timings.select_base_delay),
                timings.select_postback,
            ),
        );
        let scoped_grade = VerifiedMutator::new(
            poller,
            policy(
                RetryPolicy::fixed(6, timings.scoped_grade_delay),
                timings.mutation_idle,
            ),
        );
        let grade = VerifiedMutator::new(
            poller,
            policy(
                RetryPolicy::linear(6, timings.grade_base_delay),
                timings.mutation_idle,
            ),
        );

        Self {
            form: EvaluationForm::new(layout, timings.clone()),
            course_select,
            scoped_grade,
            grade,
            quiescence: QuiescenceDetector::new(poller),
            timings,
            expected_grade: expected_grade.into(),
        }
    }

    pub fn form(&self) -> &EvaluationForm {
        &self.form
    }

    pub async fn run(
        &self,
        driver: &dyn PageDriver,
        course: &Course,
        ctx: &CourseCtx,
    ) -> OutcomeRecord {
        let mut record = OutcomeRecord::begin(course, ctx.pass);

        // ========== 步骤 1: 选课 ==========
        self.select_course(driver, course, ctx).await;

        // ========== 步骤 2: 等待详情加载 ==========
        if let Err(e) = self.form.wait_detail_loaded(driver).await {
            warn!("{} ⚠️ 课程 {} 详情加载超时: {}", ctx, course.value, e);
            record.error = Some(EVALUATION_LOAD_TIMEOUT.to_string());
            return record.finish();
        }
        debug!("{} 课程详情已加载", ctx);

        // ========== 步骤 3: 预期成绩 ==========
        let grade_set = self.set_expected_grade(driver, ctx).await;
        record.expected_set_initial = Some(grade_set);
        record.selected_expected_grade = self.form.read_grade(driver).await;

        // ========== 步骤 4: 评价选项 ==========
        let clicked = self.form.fill_response_pattern(driver).await;
        info!("{} ✓ 已勾选 {} 个选项", ctx, clicked);
        record.radios_clicked = Some(clicked);

        // ========== 步骤 5: 评语 ==========
        self.form.clear_comment(driver).await;

        // ========== 步骤 6: 提交 ==========
        let clicked_id = self.form.submit(driver).await;
        record.submitted = Some(clicked_id.is_some());
        record.clicked_submit_id = clicked_id;
        if !record.is_submitted() {
            warn!("{} ⚠️ 没有找到可用的提交按钮", ctx);
            record.submit_error = Some(SubmitErrorKind::NoSubmitButtonFound);
            return record.finish();
        }

        // ========== 步骤 7: 修正后重新提交（最多一次） ==========
        self.quiescence
            .settle(driver, self.timings.post_submit_idle)
            .await;
        let message = self.form.read_message(driver).await;
        if !message.is_empty() {
            debug!("{} 提示信息: {}", ctx, truncate_text(&message, 80));
        }

        if message_requests_grade(&message) {
            info!("{} 🔁 页面要求选择预期成绩，修正后重新提交", ctx);
            if self.set_expected_grade(driver, ctx).await {
                let resubmitted = self.form.submit(driver).await;
                record.resubmit_after_fix = Some(resubmitted.is_some());
                record.resubmit_clicked_id = resubmitted;
            } else {
                warn!("{} ⚠️ 预期成绩修正失败", ctx);
                record.resubmit_after_fix = Some(false);
            }
        } else {
            record.resubmit_after_fix = Some(false);
        }

        record.finish()
    }

    /// 选课；校验失败时退回普通选择（不校验）
    async fn select_course(&self, driver: &dyn PageDriver, course: &Course, ctx: &CourseCtx) {
        let layout = self.form.layout();
        match self
            .course_select
            .set_field_with_postback(
                driver,
                &layout.course_select,
                &course.value,
                Some(&layout.course_postback_target),
            )
            .await
        {
            Ok(_) => debug!("{} ✓ 已选择课程 {}", ctx, course.value),
            Err(e) => {
                warn!("{} ⚠️ 选课未通过校验，改用普通选择: {}", ctx, e);
                if let Err(e) = driver
                    .select_option(&layout.course_select, &course.value)
                    .await
                {
                    debug!("{} 普通选择也失败: {}", ctx, e);
                }
                self.quiescence
                    .settle(driver, self.timings.select_postback)
                    .await;
            }
        }
    }

    /// 先在面板内设置，失败再直接按 id 设置
    async fn set_expected_grade(&self, driver: &dyn PageDriver, ctx: &CourseCtx) -> bool {
        let layout = self.form.layout();
        if self
            .scoped_grade
            .set_field_scoped(driver, &layout.grade_field, &self.expected_grade)
            .await
            .is_ok()
        {
            debug!("{} ✓ 预期成绩已设置（面板内）", ctx);
            return true;
        }
        match self
            .grade
            .set_field(driver, &layout.grade_select, &self.expected_grade)
            .await
        {
            Ok(_) => {
                debug!("{} ✓ 预期成绩已设置", ctx);
                true
            }
            Err(e) => {
                warn!("{} ⚠️ 预期成绩设置失败: {}", ctx, e);
                false
            }
        }
    }
}
