//! Task generation
//!
//! Expands per-scenario snippet definitions into [`Task`]s for one trend by
//! rendering `templates.<SCENARIO>.<key>` from the locale catalog.

use chrono::{DateTime, Utc};
use xtrend_common::models::{Locale, Scenario, ScenarioTasks, Task, Trend};

use super::i18n::{render, Catalog};

/// One snippet to render for a scenario
struct Snippet {
    task_type: &'static str,
    /// Segment used in task ids
    id_tag: &'static str,
    template_key: &'static str,
    template_id: &'static str,
    title: String,
    params: Vec<(&'static str, String)>,
}

fn pick(locale: Locale, zh: &str, en: &str) -> String {
    let text = if locale.is_chinese() { zh } else { en };
    text.to_string()
}

/// Print-on-demand product prompt; `(zh, en)` pairs
fn pod_snippet(
    locale: Locale,
    name: &str,
    task_type: &'static str,
    template_id: &'static str,
    title: (&str, &str),
    style: (&str, &str),
    specs: (&str, &str),
) -> Snippet {
    Snippet {
        task_type,
        id_tag: task_type,
        template_key: task_type,
        template_id,
        title: pick(locale, title.0, title.1),
        params: vec![
            ("trendName", name.to_string()),
            ("style", pick(locale, style.0, style.1)),
            ("specs", pick(locale, specs.0, specs.1)),
        ],
    }
}

fn snippets(scenario: Scenario, name: &str, locale: Locale) -> Vec<Snippet> {
    let name_param = ("trendName", name.to_string());

    match scenario {
        Scenario::Pod => vec![
            pod_snippet(
                locale,
                name,
                "tshirt",
                "pod-tshirt-v1",
                ("T恤设计提示词", "T-Shirt Design Prompt"),
                ("简约时尚风格", "Minimalist trendy style"),
                ("纯棉材质，多色可选，S-5XL", "100% cotton, multiple colors, S-5XL"),
            ),
            pod_snippet(
                locale,
                name,
                "tote",
                "pod-tote-v1",
                ("帆布袋设计提示词", "Tote Bag Design Prompt"),
                ("潮流帆布袋", "Chic canvas tote"),
                ("环保材质，大容量", "Eco-friendly, large capacity"),
            ),
            pod_snippet(
                locale,
                name,
                "mug",
                "pod-mug-v1",
                ("马克杯设计提示词", "Mug Design Prompt"),
                ("陶瓷马克杯", "Ceramic coffee mug"),
                ("11盎司，微波炉安全", "11oz, microwave safe"),
            ),
            pod_snippet(
                locale,
                name,
                "phonecase",
                "pod-phonecase-v1",
                ("手机壳设计提示词", "Phone Case Design Prompt"),
                ("防摔手机壳", "Protective phone case"),
                ("适用于iPhone/Android系列", "Fits iPhone/Android series"),
            ),
        ],

        Scenario::Content => vec![
            Snippet {
                task_type: "video-topic",
                id_tag: "video",
                template_key: "videoTopic",
                template_id: "content-video-v1",
                title: pick(locale, "视频选题", "Video Topic"),
                params: vec![
                    name_param.clone(),
                    (
                        "outline",
                        if locale.is_chinese() {
                            format!(
                                "1. 开场：{name} 为什么火？\n2. 背景介绍：事件来龙去脉\n3. 深度分析：背后的原因\n4. 趋势预测：接下来会怎样？\n5. 互动：你如何看待 {name}？"
                            )
                        } else {
                            format!(
                                "1. Intro: Why is {name} trending?\n2. Background: The full story\n3. Analysis: What's behind it\n4. Prediction: What's next?\n5. Call to Action: What do you think about {name}?"
                            )
                        },
                    ),
                ],
            },
            Snippet {
                task_type: "script-outline",
                id_tag: "script",
                template_key: "scriptOutline",
                template_id: "content-script-v1",
                title: pick(locale, "脚本大纲", "Script Outline"),
                params: vec![
                    name_param,
                    ("duration", pick(locale, "3-5分钟", "3-5 minutes")),
                    ("style", pick(locale, "轻松幽默", "Light-hearted")),
                    (
                        "sections",
                        pick(
                            locale,
                            "开场(30秒) → 主体(2-3分钟) → 结尾(30秒)",
                            "Intro(30s) → Body(2-3min) → Outro(30s)",
                        ),
                    ),
                ],
            },
        ],

        Scenario::Marketing => vec![
            Snippet {
                task_type: "title",
                id_tag: "title",
                template_key: "title",
                template_id: "marketing-title-v1",
                title: pick(locale, "促销标题", "Promo Title"),
                params: vec![
                    name_param.clone(),
                    ("emoji", "🔥".to_string()),
                    (
                        "headline",
                        if locale.is_chinese() {
                            format!("抓住 {name} 潮流")
                        } else {
                            format!("Catch the {name} Wave")
                        },
                    ),
                    ("cta", pick(locale, "限时优惠！", "Limited Time Offer!")),
                ],
            },
            Snippet {
                task_type: "description",
                id_tag: "desc",
                template_key: "description",
                template_id: "marketing-desc-v1",
                title: pick(locale, "商品描述", "Product Description"),
                params: vec![
                    name_param.clone(),
                    (
                        "features",
                        pick(locale, "精选材质，舒适耐用", "Premium quality, comfort guaranteed"),
                    ),
                    (
                        "appeal",
                        pick(locale, "限量发售，售完即止", "Limited edition, while supplies last"),
                    ),
                ],
            },
            Snippet {
                task_type: "tags",
                id_tag: "tags",
                template_key: "tags",
                template_id: "marketing-tags-v1",
                title: pick(locale, "推荐标签", "Recommended Tags"),
                params: vec![
                    name_param,
                    ("relatedTags", pick(locale, "热门,潮流,新品", "trending,viral,new")),
                ],
            },
        ],

        Scenario::Development => vec![
            Snippet {
                task_type: "requirement",
                id_tag: "req",
                template_key: "requirement",
                template_id: "dev-req-v1",
                title: pick(locale, "功能需求", "Feature Requirements"),
                params: vec![
                    name_param.clone(),
                    (
                        "goal",
                        if locale.is_chinese() {
                            format!("帮助用户快速获取 {name} 相关信息")
                        } else {
                            format!("Help users quickly access {name} information")
                        },
                    ),
                    (
                        "features",
                        pick(
                            locale,
                            "- 实时数据展示\n- 个性化推荐\n- 数据可视化",
                            "- Real-time data display\n- Personalized recommendations\n- Data visualization",
                        ),
                    ),
                ],
            },
            Snippet {
                task_type: "tech-stack",
                id_tag: "tech",
                template_key: "techStack",
                template_id: "dev-tech-v1",
                title: pick(locale, "技术方向", "Tech Stack"),
                params: vec![
                    name_param,
                    ("frontend", "Next.js + Tailwind CSS".to_string()),
                    ("backend", "Node.js + Express".to_string()),
                    ("database", "PostgreSQL".to_string()),
                    ("deployment", "Vercel + Railway".to_string()),
                ],
            },
        ],
    }
}

/// Render a template, falling back to a literal when the catalog lacks it
fn render_template(
    catalog: &Catalog,
    locale: Locale,
    key: &str,
    params: &[(&'static str, String)],
) -> String {
    if let Some(template) = catalog.lookup(locale, key) {
        return render(template, params);
    }

    let name = params
        .iter()
        .find(|(k, _)| *k == "trendName")
        .map(|(_, v)| v.as_str())
        .unwrap_or_default();

    if key.ends_with(".tshirt") {
        return if locale.is_chinese() {
            format!("一款适合{}的潮流T恤设计", name)
        } else {
            format!("A trendy t-shirt design for {}", name)
        };
    }

    let json: serde_json::Map<String, serde_json::Value> = params
        .iter()
        .map(|(k, v)| (k.to_string(), serde_json::Value::String(v.clone())))
        .collect();
    format!("Template: {} - {}", key, serde_json::Value::Object(json))
}

/// Tasks for one trend, one group per requested scenario in request order
pub fn generate_tasks(
    catalog: &Catalog,
    trend: &Trend,
    scenarios: &[Scenario],
    locale: Locale,
) -> Vec<ScenarioTasks> {
    generate_tasks_at(catalog, trend, scenarios, locale, Utc::now())
}

/// [`generate_tasks`] with an explicit creation time
pub fn generate_tasks_at(
    catalog: &Catalog,
    trend: &Trend,
    scenarios: &[Scenario],
    locale: Locale,
    now: DateTime<Utc>,
) -> Vec<ScenarioTasks> {
    let name = trend.label();
    let millis = now.timestamp_millis();

    scenarios
        .iter()
        .map(|&scenario| {
            let tasks = snippets(scenario, name, locale)
                .into_iter()
                .map(|snippet| {
                    let key = format!("templates.{}.{}", scenario.as_str(), snippet.template_key);
                    let content = render_template(catalog, locale, &key, &snippet.params);
                    Task {
                        id: format!("task-{}-{}-{}", trend.id, snippet.id_tag, millis),
                        trend_id: trend.id.clone(),
                        scenario,
                        task_type: snippet.task_type.to_string(),
                        title: snippet.title,
                        word_count: content.chars().count(),
                        content,
                        template_id: snippet.template_id.to_string(),
                        created_at: now,
                    }
                })
                .collect();

            ScenarioTasks {
                scenario,
                scenario_name: scenario.display_name(locale).to_string(),
                tasks,
            }
        })
        .collect()
}
