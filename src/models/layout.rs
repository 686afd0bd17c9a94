//! UCAM 页面结构
//!
//! 所有元素 id / 选择器集中在这里，业务代码只引用字段名

use crate::infrastructure::Locator;

/// 通过"容器 + 标签文本"定位的下拉框
///
/// 页面上可能存在多个同名下拉框时，用标签所在的面板限定范围
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopedField {
    /// 容器的 XPath
    pub container_xpath: String,
    /// 标签文本（完全匹配，忽略首尾空白）
    pub label: String,
}

impl ScopedField {
    /// 标签之后的第一个下拉框
    pub fn locator(&self) -> Locator {
        Locator::xpath(format!(
            "{}//label[normalize-space()='{}']/following::select[1]",
            self.container_xpath, self.label
        ))
    }
}

/// 课程评估页结构
#[derive(Debug, Clone)]
pub struct EvaluationLayout {
    pub course_select: Locator,
    /// 选课后需要触发的 postback 目标
    pub course_postback_target: String,
    /// "未选择"之类的占位选项值
    pub sentinel_values: Vec<String>,
    pub detail_panel: Locator,
    pub faculty_label: Locator,
    pub grade_select: Locator,
    pub grade_field: ScopedField,
    pub response_table: Locator,
    /// 表格内"非常同意"单选框
    pub response_choice: String,
    pub comment_box: Locator,
    /// 按优先顺序排列的提交按钮
    pub submit_buttons: Vec<Locator>,
    pub message_label: Locator,
    pub status_label: Locator,
    pub busy_indicator: Locator,
}

impl Default for EvaluationLayout {
    fn default() -> Self {
        Self {
            course_select: Locator::id("ctl00_MainContainer_ddlAcaCalSection"),
            course_postback_target: "ctl00$MainContainer$ddlAcaCalSection".to_string(),
            sentinel_values: vec!["0".to_string(), "0_0".to_string()],
            detail_panel: Locator::css("table.evaluationTable"),
            faculty_label: Locator::id("ctl00_MainContainer_lblFacultyName"),
            grade_select: Locator::id("ctl00_MainContainer_ddlExpectedGrade"),
            grade_field: ScopedField {
                container_xpath: "//div[contains(@class,'panel') and contains(@class,'panel-default') and contains(@class,'pp')]".to_string(),
                label: "Expected Grade".to_string(),
            },
            response_table: Locator::css("table.evaluationTable"),
            response_choice: r#"input[type=radio][value="5"]"#.to_string(),
            comment_box: Locator::id("ctl00_MainContainer_txtTheoryComments"),
            submit_buttons: vec![
                Locator::id("ctl00_MainContainer_btnLabSubmit"),
                Locator::id("ctl00_MainContainer_btnTheorySubmit"),
                Locator::id("ctl00_MainContainer_btnTheoryTop"),
            ],
            message_label: Locator::id("ctl00_MainContainer_lblMsg"),
            status_label: Locator::id("ctl00_MainContainer_lblEvaluationStatus"),
            busy_indicator: Locator::id("divProgress"),
        }
    }
}

impl EvaluationLayout {
    /// 是否为占位选项
    pub fn is_sentinel(&self, value: &str) -> bool {
        let value = value.trim();
        value.is_empty()
            || self
                .sentinel_values
                .iter()
                .any(|s| s.eq_ignore_ascii_case(value))
    }
}

/// 登录页与导航菜单结构
#[derive(Debug, Clone)]
pub struct PortalLayout {
    pub username_input: Locator,
    pub password_input: Locator,
    pub login_button: Locator,
    /// 依次点击进入课程评估页的菜单项
    pub menu_path: Vec<Locator>,
    /// 到达评估页后的标志元素
    pub landing_marker: Locator,
}

impl Default for PortalLayout {
    fn default() -> Self {
        Self {
            username_input: Locator::id("logMain_UserName"),
            password_input: Locator::id("logMain_Password"),
            login_button: Locator::id("logMain_Button1"),
            menu_path: vec![
                Locator::xpath("/html/body/form/div[3]/div[2]/div/div/div/div/div[2]/div[1]/ul/li[5]/a"),
                Locator::xpath("/html/body/form/div[3]/div[2]/div/div/div/div/div[2]/div[1]/ul/li[1]"),
                Locator::xpath("/html/body/form/div[3]/div[2]/div/div/div/div/div[2]/div[1]/ul/li[1]/ul/li/a"),
            ],
            landing_marker: Locator::css("h1"),
        }
    }
}
