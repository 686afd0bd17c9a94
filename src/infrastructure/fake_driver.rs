//! 内存中的评估页模拟
//!
//! 按 `EvaluationLayout` / `PortalLayout` 的定位器解释各种操作，行为尽量贴近真实页面：
//! 选课会重置整个评估面板，提交会校验预期成绩，状态标签在全部课程提交后变为 `Completed!`。

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::error::{DomError, DomResult};
use crate::infrastructure::{AsyncActivity, Locator, PageDriver, SelectOption};
use crate::models::{EvaluationLayout, PortalLayout};

pub(crate) const RADIOS_PER_COURSE: usize = 10;
pub(crate) const LOGIN_URL: &str = "https://ucam.test/Security/Login.aspx";
pub(crate) const DASHBOARD_URL: &str = "https://ucam.test/Dashboard.aspx";
pub(crate) const EVALUATION_URL: &str = "https://ucam.test/Evaluation.aspx";
const GRADE_PROMPT: &str = "Please select your Expected Grade before submitting.";
const SUBMIT_OK: &str = "Evaluation submitted successfully.";

/// 单门课程的页面行为
#[derive(Debug, Clone, Default)]
pub(crate) struct CourseBehavior {
    /// 详情面板永远加载不出来
    pub never_loads: bool,
    /// 第一次提交时提示预期成绩未选择（并清空预期成绩）
    pub complains_about_grade: bool,
    /// 页面上没有任何提交按钮
    pub no_submit_button: bool,
    /// 第 n 次选择（以 postback 计）起详情才能加载
    pub loads_from_visit: Option<usize>,
}

#[derive(Debug)]
struct FakeState {
    courses: Vec<SelectOption>,
    /// 首次选课之后才出现在下拉框中的课程
    hidden_courses: Vec<SelectOption>,
    behaviors: HashMap<String, CourseBehavior>,
    selected: String,
    loaded: bool,
    grade: String,
    radios: Vec<bool>,
    comment: String,
    message: String,
    accepted: HashSet<String>,
    complained: HashSet<String>,
    submit_clicks: HashMap<String, usize>,
    visits: HashMap<String, usize>,
    status_override: Option<String>,
    async_available: bool,
    busy_polls: usize,
    /// 进度指示器还会保持可见的检查次数
    progress_polls: usize,
    /// 课程下拉框读回的总是占位值（页面不认 value 回读）
    course_select_stale: bool,
    course_selects: usize,
    grade_resists: usize,
    grade_writes: usize,
    postbacks: Vec<String>,
    url: String,
    credentials: (String, String),
    typed: HashMap<Locator, String>,
    logged_in: bool,
    menu_clicked: usize,
    broken_menu: Option<usize>,
}

pub(crate) struct FakeDriver {
    layout: EvaluationLayout,
    portal: PortalLayout,
    state: Mutex<FakeState>,
}

impl FakeDriver {
    /// 已登录、停在课程评估页、尚未选课
    pub fn new(courses: &[(&str, &str)]) -> Self {
        let courses = courses
            .iter()
            .map(|(value, label)| SelectOption {
                value: value.to_string(),
                label: label.to_string(),
            })
            .collect();
        Self {
            layout: EvaluationLayout::default(),
            portal: PortalLayout::default(),
            state: Mutex::new(FakeState {
                courses,
                hidden_courses: Vec::new(),
                behaviors: HashMap::new(),
                selected: "0_0".to_string(),
                loaded: false,
                grade: "0".to_string(),
                radios: Vec::new(),
                comment: String::new(),
                message: String::new(),
                accepted: HashSet::new(),
                complained: HashSet::new(),
                submit_clicks: HashMap::new(),
                visits: HashMap::new(),
                status_override: None,
                async_available: true,
                busy_polls: 0,
                progress_polls: 0,
                course_select_stale: false,
                course_selects: 0,
                grade_resists: 0,
                grade_writes: 0,
                postbacks: Vec::new(),
                url: EVALUATION_URL.to_string(),
                credentials: ("011201001".to_string(), "secret".to_string()),
                typed: HashMap::new(),
                logged_in: true,
                menu_clicked: 3,
                broken_menu: None,
            }),
        }
    }

    /// 未登录，停在空白页
    pub fn logged_out(courses: &[(&str, &str)]) -> Self {
        let driver = Self::new(courses);
        {
            let mut state = driver.state();
            state.logged_in = false;
            state.menu_clicked = 0;
            state.url = "about:blank".to_string();
        }
        driver
    }

    fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn with_behavior(self, value: &str, behavior: CourseBehavior) -> Self {
        self.state().behaviors.insert(value.to_string(), behavior);
        self
    }

    pub fn reveal_after_first_selection(self, value: &str, label: &str) -> Self {
        self.state().hidden_courses.push(SelectOption {
            value: value.to_string(),
            label: label.to_string(),
        });
        self
    }

    pub fn set_status_override(&self, status: &str) {
        self.state().status_override = Some(status.to_string());
    }

    pub fn set_busy_polls(&self, polls: usize) {
        self.state().busy_polls = polls;
    }

    pub fn busy_polls_left(&self) -> usize {
        self.state().busy_polls
    }

    pub fn set_progress_polls(&self, polls: usize) {
        self.state().progress_polls = polls;
    }

    pub fn progress_polls_left(&self) -> usize {
        self.state().progress_polls
    }

    pub fn set_course_select_stale(&self, stale: bool) {
        self.state().course_select_stale = stale;
    }

    /// `select_option` 作用在课程下拉框上的次数
    pub fn course_selects(&self) -> usize {
        self.state().course_selects
    }

    pub fn set_async_probe_available(&self, available: bool) {
        self.state().async_available = available;
    }

    pub fn set_grade_resists(&self, writes: usize) {
        self.state().grade_resists = writes;
    }

    pub fn break_menu_at(&self, index: usize) {
        self.state().broken_menu = Some(index);
    }

    pub fn grade(&self) -> String {
        self.state().grade.clone()
    }

    pub fn grade_writes(&self) -> usize {
        self.state().grade_writes
    }

    pub fn postbacks(&self) -> Vec<String> {
        self.state().postbacks.clone()
    }

    pub fn submit_clicks(&self, value: &str) -> usize {
        self.state().submit_clicks.get(value).copied().unwrap_or(0)
    }

    pub fn is_accepted(&self, value: &str) -> bool {
        self.state().accepted.contains(value)
    }

    pub fn checked_radios(&self) -> usize {
        self.state().radios.iter().filter(|r| **r).count()
    }

    pub fn comment(&self) -> String {
        self.state().comment.clone()
    }

    pub fn is_logged_in(&self) -> bool {
        self.state().logged_in
    }

    pub fn menu_clicked(&self) -> usize {
        self.state().menu_clicked
    }

    fn is_grade(&self, locator: &Locator) -> bool {
        *locator == self.layout.grade_select || *locator == self.layout.grade_field.locator()
    }

    fn radio_index(&self, locator: &Locator) -> Option<usize> {
        match locator {
            Locator::Nth {
                container,
                selector,
                index,
            } if **container == self.layout.response_table
                && *selector == self.layout.response_choice =>
            {
                Some(*index)
            }
            _ => None,
        }
    }

    fn submit_index(&self, locator: &Locator) -> Option<usize> {
        self.layout.submit_buttons.iter().position(|b| b == locator)
    }

    fn menu_index(&self, locator: &Locator) -> Option<usize> {
        self.portal.menu_path.iter().position(|m| m == locator)
    }

    fn is_login_form(&self, locator: &Locator) -> bool {
        *locator == self.portal.username_input
            || *locator == self.portal.password_input
            || *locator == self.portal.login_button
    }

    fn present(&self, state: &FakeState, locator: &Locator) -> bool {
        if *locator == self.layout.course_select
            || *locator == self.layout.faculty_label
            || *locator == self.layout.message_label
            || *locator == self.layout.status_label
        {
            return state.logged_in && state.menu_clicked >= 3;
        }
        if *locator == self.layout.detail_panel
            || *locator == self.layout.comment_box
            || self.is_grade(locator)
        {
            return state.loaded;
        }
        if let Some(i) = self.radio_index(locator) {
            return state.loaded && i < state.radios.len();
        }
        if let Some(i) = self.submit_index(locator) {
            // 实验课提交按钮不存在，只剩理论课的两个
            let no_button = state
                .behaviors
                .get(&state.selected)
                .map_or(false, |b| b.no_submit_button);
            return state.loaded && i > 0 && !no_button;
        }
        if self.is_login_form(locator) {
            return !state.logged_in && state.url == LOGIN_URL;
        }
        if let Some(i) = self.menu_index(locator) {
            return state.logged_in && state.broken_menu != Some(i);
        }
        if *locator == self.portal.landing_marker {
            return state.menu_clicked >= 3;
        }
        if *locator == self.layout.busy_indicator {
            return state.progress_polls > 0;
        }
        false
    }

    fn require(&self, state: &FakeState, locator: &Locator) -> DomResult<()> {
        if self.present(state, locator) {
            Ok(())
        } else {
            Err(DomError::NotFound(locator.to_string()))
        }
    }

    fn load_course(&self, state: &mut FakeState, value: &str) {
        state.selected = value.to_string();
        state.message.clear();
        state.grade = "0".to_string();
        state.comment = "Nice course".to_string();
        let is_course = state.courses.iter().any(|c| c.value == value);
        let delayed = state
            .behaviors
            .get(value)
            .map_or(false, |b| b.never_loads || b.loads_from_visit.is_some());
        self.set_loaded(state, is_course && !delayed);
        if is_course && !state.hidden_courses.is_empty() {
            let revealed = std::mem::take(&mut state.hidden_courses);
            state.courses.extend(revealed);
        }
    }

    fn set_loaded(&self, state: &mut FakeState, loaded: bool) {
        state.loaded = loaded;
        state.radios = if loaded {
            vec![false; RADIOS_PER_COURSE]
        } else {
            Vec::new()
        };
    }

    fn write(&self, locator: &Locator, value: &str) -> DomResult<()> {
        let mut state = self.state();
        self.require(&state, locator)?;
        if *locator == self.layout.course_select {
            let known = value == "0_0" || state.courses.iter().any(|c| c.value == value);
            if !known {
                return Err(DomError::NotFound(format!("{} 中的选项 '{}'", locator, value)));
            }
            self.load_course(&mut state, value);
            return Ok(());
        }
        if self.is_grade(locator) {
            state.grade_writes += 1;
            if state.grade_resists > 0 {
                if state.grade_resists != usize::MAX {
                    state.grade_resists -= 1;
                }
                return Ok(());
            }
            state.grade = value.to_string();
            return Ok(());
        }
        Err(DomError::Script(format!("{} 不是下拉框", locator)))
    }

    fn press(&self, locator: &Locator) -> DomResult<()> {
        let mut state = self.state();
        self.require(&state, locator)?;

        if let Some(i) = self.radio_index(locator) {
            state.radios[i] = true;
        } else if self.submit_index(locator).is_some() {
            let course = state.selected.clone();
            *state.submit_clicks.entry(course.clone()).or_insert(0) += 1;
            let complains = state
                .behaviors
                .get(&course)
                .map_or(false, |b| b.complains_about_grade);
            if complains && state.complained.insert(course.clone()) {
                state.grade = "0".to_string();
                state.message = GRADE_PROMPT.to_string();
            } else if state.grade == "0" {
                state.message = GRADE_PROMPT.to_string();
            } else {
                state.accepted.insert(course);
                state.message = SUBMIT_OK.to_string();
            }
        } else if *locator == self.portal.login_button {
            let typed_user = state.typed.get(&self.portal.username_input).cloned();
            let typed_pass = state.typed.get(&self.portal.password_input).cloned();
            if typed_user.as_deref() == Some(state.credentials.0.as_str())
                && typed_pass.as_deref() == Some(state.credentials.1.as_str())
            {
                state.logged_in = true;
                state.url = DASHBOARD_URL.to_string();
            }
        } else if let Some(i) = self.menu_index(locator) {
            if i == state.menu_clicked {
                state.menu_clicked += 1;
                if state.menu_clicked >= 3 {
                    state.url = EVALUATION_URL.to_string();
                }
            }
        }
        Ok(())
    }

    fn status_text(&self, state: &FakeState) -> String {
        if let Some(status) = &state.status_override {
            return status.clone();
        }
        if state.courses.iter().all(|c| state.accepted.contains(&c.value)) {
            "Completed!".to_string()
        } else {
            "Pending!".to_string()
        }
    }
}

#[async_trait]
impl PageDriver for FakeDriver {
    async fn navigate(&self, url: &str) -> DomResult<()> {
        let mut state = self.state();
        state.url = url.to_string();
        if !state.logged_in {
            state.menu_clicked = 0;
        }
        Ok(())
    }

    async fn current_url(&self) -> DomResult<String> {
        Ok(self.state().url.clone())
    }

    async fn is_present(&self, locator: &Locator) -> DomResult<bool> {
        let state = self.state();
        Ok(self.present(&state, locator))
    }

    async fn is_visible(&self, locator: &Locator) -> DomResult<bool> {
        let mut state = self.state();
        if *locator == self.layout.busy_indicator && state.progress_polls > 0 {
            state.progress_polls -= 1;
            return Ok(true);
        }
        Ok(self.present(&state, locator))
    }

    async fn read_text(&self, locator: &Locator) -> DomResult<String> {
        let state = self.state();
        self.require(&state, locator)?;
        if *locator == self.layout.faculty_label {
            return Ok(if state.loaded {
                format!("Dr. Faculty {}", state.selected)
            } else {
                "__________".to_string()
            });
        }
        if *locator == self.layout.message_label {
            return Ok(state.message.clone());
        }
        if *locator == self.layout.status_label {
            return Ok(self.status_text(&state));
        }
        Ok(String::new())
    }

    async fn read_value(&self, locator: &Locator) -> DomResult<String> {
        let state = self.state();
        self.require(&state, locator)?;
        if *locator == self.layout.course_select {
            if state.course_select_stale {
                return Ok("0_0".to_string());
            }
            return Ok(state.selected.clone());
        }
        if self.is_grade(locator) {
            return Ok(state.grade.clone());
        }
        if *locator == self.layout.comment_box {
            return Ok(state.comment.clone());
        }
        Ok(state.typed.get(locator).cloned().unwrap_or_default())
    }

    async fn is_checked(&self, locator: &Locator) -> DomResult<bool> {
        let state = self.state();
        self.require(&state, locator)?;
        Ok(self
            .radio_index(locator)
            .and_then(|i| state.radios.get(i).copied())
            .unwrap_or(false))
    }

    async fn count_matching(&self, container: &Locator, selector: &str) -> DomResult<usize> {
        let state = self.state();
        self.require(&state, container)?;
        if *container == self.layout.response_table && selector == self.layout.response_choice {
            Ok(state.radios.len())
        } else {
            Ok(0)
        }
    }

    async fn list_options(&self, select: &Locator) -> DomResult<Vec<SelectOption>> {
        let state = self.state();
        self.require(&state, select)?;
        let mut options = vec![SelectOption {
            value: "0_0".to_string(),
            label: "Select Course".to_string(),
        }];
        if *select == self.layout.course_select {
            options.extend(state.courses.iter().cloned());
        }
        Ok(options)
    }

    async fn click(&self, locator: &Locator) -> DomResult<()> {
        self.press(locator)
    }

    async fn js_click(&self, locator: &Locator) -> DomResult<()> {
        self.press(locator)
    }

    async fn scroll_into_view(&self, locator: &Locator) -> DomResult<()> {
        let state = self.state();
        self.require(&state, locator)
    }

    async fn type_text(&self, locator: &Locator, text: &str) -> DomResult<()> {
        let mut state = self.state();
        self.require(&state, locator)?;
        state.typed.insert(locator.clone(), text.to_string());
        Ok(())
    }

    async fn clear(&self, locator: &Locator) -> DomResult<()> {
        let mut state = self.state();
        self.require(&state, locator)?;
        if *locator == self.layout.comment_box {
            state.comment.clear();
        } else {
            state.typed.remove(locator);
        }
        Ok(())
    }

    async fn inject_value(&self, locator: &Locator, value: &str) -> DomResult<()> {
        self.write(locator, value)
    }

    async fn click_option(&self, select: &Locator, value_or_label: &str) -> DomResult<()> {
        self.write(select, value_or_label)
    }

    async fn select_option(&self, select: &Locator, value_or_label: &str) -> DomResult<()> {
        if *select == self.layout.course_select {
            self.state().course_selects += 1;
        }
        self.write(select, value_or_label)
    }

    async fn async_activity(&self) -> DomResult<AsyncActivity> {
        let mut state = self.state();
        if !state.async_available {
            return Err(DomError::Script("ReferenceError: Sys is not defined".to_string()));
        }
        if state.busy_polls > 0 {
            if state.busy_polls != usize::MAX {
                state.busy_polls -= 1;
            }
            return Ok(AsyncActivity {
                jquery_active: Some(1),
                in_async_postback: Some(true),
            });
        }
        Ok(AsyncActivity {
            jquery_active: Some(0),
            in_async_postback: Some(false),
        })
    }

    async fn postback(&self, target: &str) -> DomResult<()> {
        let mut state = self.state();
        state.postbacks.push(target.to_string());

        let course = state.selected.clone();
        let visits = {
            let count = state.visits.entry(course.clone()).or_insert(0);
            *count += 1;
            *count
        };
        let ready = state
            .behaviors
            .get(&course)
            .and_then(|b| b.loads_from_visit)
            .map_or(false, |from| visits >= from);
        if ready && !state.loaded {
            self.set_loaded(&mut state, true);
        }
        Ok(())
    }
}
