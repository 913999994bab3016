use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacetRule {
    pub label: String,
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackSpec {
    pub id: String,
    pub weekly_target: i64,
    #[serde(default)]
    pub facets: Vec<FacetRule>,
}

/// One ordered classification entry. Carrying a `track` makes it a track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRule {
    pub label: String,
    pub keywords: Vec<String>,
    #[serde(default)]
    pub track: Option<TrackSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriorityRules {
    pub high: Vec<String>,
    pub low: Vec<String>,
}

impl Default for PriorityRules {
    fn default() -> Self {
        Self {
            high: words(&["紧急", "关键", "高优", "urgent", "important", "p0"]),
            low: words(&["低优", "次要", "later", "p2"]),
        }
    }
}

/// Keyword configuration for the whole pipeline. Entry order in
/// `categories` and in each track's `facets` is first-match-wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleTable {
    pub categories: Vec<CategoryRule>,
    pub priority: PriorityRules,
    pub learning_triggers: Vec<String>,
    pub deep_work_hints: Vec<String>,
    pub unclassified_label: String,
    pub default_focus: String,
}

fn words(list: &[&str]) -> Vec<String> {
    list.iter().map(|w| (*w).to_string()).collect()
}

fn facet(label: &str, keywords: &[&str]) -> FacetRule {
    FacetRule {
        label: label.to_string(),
        keywords: words(keywords),
    }
}

fn category(label: &str, keywords: &[&str]) -> CategoryRule {
    CategoryRule {
        label: label.to_string(),
        keywords: words(keywords),
        track: None,
    }
}

fn track(
    label: &str,
    keywords: &[&str],
    id: &str,
    weekly_target: i64,
    facets: Vec<FacetRule>,
) -> CategoryRule {
    CategoryRule {
        label: label.to_string(),
        keywords: words(keywords),
        track: Some(TrackSpec {
            id: id.to_string(),
            weekly_target,
            facets,
        }),
    }
}

impl Default for RuleTable {
    fn default() -> Self {
        Self {
            categories: vec![
                track(
                    "研究",
                    &["论文", "paper", "emotion", "情感", "模型", "benchmark", "sota", "检索"],
                    "research",
                    10,
                    vec![
                        facet("论文阅读", &["论文", "paper", "阅读", "arxiv"]),
                        facet("实验", &["实验", "experiment", "benchmark", "训练", "sota"]),
                        facet("写作", &["写作", "投稿", "draft", "rebuttal"]),
                    ],
                ),
                category(
                    "开发",
                    &["代码", "debug", "bug", "python", "脚本", "app", "部署", "github", "前端"],
                ),
                category(
                    "运维",
                    &["gateway", "配置", "权限", "终端", "restart", "status", "日志", "服务"],
                ),
                category("沟通", &["imessage", "消息", "聊天", "手机", "email", "邮件"]),
                track(
                    "语言",
                    &["英语", "日语", "单词", "vocabulary", "grammar", "口语", "听力", "ielts"],
                    "language",
                    7,
                    vec![
                        facet("词汇", &["单词", "词汇", "vocabulary"]),
                        facet("听说", &["口语", "听力", "speaking", "listening"]),
                        facet("语法", &["语法", "grammar"]),
                    ],
                ),
                track(
                    "健身",
                    &["健身", "跑步", "workout", "gym", "锻炼", "瑜伽", "深蹲"],
                    "fitness",
                    4,
                    vec![
                        facet("有氧", &["跑步", "骑行", "游泳", "cardio"]),
                        facet("力量", &["力量", "深蹲", "卧推", "strength"]),
                        facet("拉伸", &["拉伸", "瑜伽", "stretch", "yoga"]),
                    ],
                ),
            ],
            priority: PriorityRules::default(),
            learning_triggers: words(&[
                "如何", "怎么", "能不能", "为什么", "what", "how", "对比", "区别", "总结", "learn",
                "学到", "复盘", "笔记",
            ]),
            deep_work_hints: words(&[
                "深度", "专注", "45", "阅读", "写作", "设计", "编码", "coding", "research",
            ]),
            unclassified_label: "其他".to_string(),
            default_focus: "综合推进".to_string(),
        }
    }
}

fn normalize_keywords(list: &[String]) -> Vec<String> {
    list.iter()
        .map(|kw| kw.trim().to_lowercase())
        .filter(|kw| !kw.is_empty())
        .collect()
}

impl RuleTable {
    /// Lower-case every keyword and drop blanks so matching is a plain
    /// substring test. Order is preserved.
    pub fn normalized(&self) -> Self {
        let mut out = self.clone();
        for rule in &mut out.categories {
            rule.keywords = normalize_keywords(&rule.keywords);
            if let Some(track) = rule.track.as_mut() {
                for facet in &mut track.facets {
                    facet.keywords = normalize_keywords(&facet.keywords);
                }
            }
        }
        out.priority.high = normalize_keywords(&out.priority.high);
        out.priority.low = normalize_keywords(&out.priority.low);
        out.learning_triggers = normalize_keywords(&out.learning_triggers);
        out.deep_work_hints = normalize_keywords(&out.deep_work_hints);
        out
    }

    pub fn tracks(&self) -> impl Iterator<Item = (&CategoryRule, &TrackSpec)> {
        self.categories
            .iter()
            .filter_map(|rule| rule.track.as_ref().map(|track| (rule, track)))
    }

    pub fn validate(&self) -> Result<()> {
        let mut labels = BTreeSet::new();
        let mut track_ids = BTreeSet::new();
        for rule in &self.categories {
            let label = rule.label.trim();
            if label.is_empty() {
                return Err(anyhow!("invalid rule table: category label cannot be empty"));
            }
            if label == self.unclassified_label.trim() {
                return Err(anyhow!(
                    "invalid rule table: `{label}` is reserved for unclassified text"
                ));
            }
            if !labels.insert(label.to_string()) {
                return Err(anyhow!("invalid rule table: duplicate category `{label}`"));
            }
            if let Some(track) = &rule.track {
                let id = track.id.trim();
                if id.is_empty() {
                    return Err(anyhow!(
                        "invalid rule table: track id for `{label}` cannot be empty"
                    ));
                }
                if !track_ids.insert(id.to_string()) {
                    return Err(anyhow!("invalid rule table: duplicate track id `{id}`"));
                }
            }
        }
        if self.unclassified_label.trim().is_empty() {
            return Err(anyhow!("invalid rule table: unclassified label cannot be empty"));
        }
        if self.default_focus.trim().is_empty() {
            return Err(anyhow!("invalid rule table: default focus cannot be empty"));
        }
        Ok(())
    }
}
