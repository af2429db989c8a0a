use std::sync::LazyLock;

use galaxy_common::{Category, ClassificationRecord};
use regex::Regex;
use uuid::Uuid;

static RE_CLOSING_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)</(\s*)(div|pre|textarea|script)").expect("closing tag pattern is valid")
});

/// Render one bookmark card. Prompt cards get a fresh random element id.
pub fn render_card(record: &ClassificationRecord) -> String {
    let id = format!("p-{}", &Uuid::new_v4().simple().to_string()[..6]);
    render_card_with_id(record, &id)
}

/// Same as [`render_card`] with a caller-chosen prompt card id.
pub fn render_card_with_id(record: &ClassificationRecord, id: &str) -> String {
    match record.section {
        Category::Prompts => render_prompt_card(record, id),
        Category::Apk => render_app_card(record),
        _ => render_generic_card(record),
    }
}

fn render_prompt_card(record: &ClassificationRecord, id: &str) -> String {
    let style = record.section.style();
    let body = record.prompt_body.as_deref().unwrap_or_default();
    format!(
        r#"
<div class="glass-card p-8 rounded-[2rem] border-l-4 border-{color}-500 mb-6 reveal active relative overflow-hidden group">
    <div class="absolute top-0 right-0 p-4 opacity-10 group-hover:opacity-20 transition-opacity">
        <i class="fas fa-{icon} text-6xl text-{color}-500"></i>
    </div>
    <div class="relative z-10">
        <div class="flex justify-between items-center mb-4">
            <div>
                <span class="text-[9px] font-black text-{color}-400 tracking-widest uppercase">AI PROMPT</span>
                <h3 class="text-xl font-bold text-white mt-1">{name}</h3>
            </div>
            <button onclick="copyToClipboard('{id}-text')" class="bg-white/5 hover:bg-{color}-500/20 border border-white/10 px-4 py-2 rounded-xl text-xs font-bold transition-all flex items-center gap-2">
                <i class="fas fa-copy"></i> Copy
            </button>
        </div>
        <div class="bg-black/30 rounded-xl p-4 border border-white/5">
            <div id="{id}-text" class="text-xs text-gray-300 font-mono leading-relaxed whitespace-pre-wrap max-h-40 overflow-y-auto custom-scrollbar">{body}</div>
        </div>
        <p class="text-gray-500 text-xs mt-3 italic">{desc}</p>
    </div>
</div>
"#,
        color = style.color,
        icon = style.icon,
        id = html_escape(id),
        name = html_escape(&record.name),
        body = html_escape(&neutralize_closing_tags(body)),
        desc = html_escape(&record.desc),
    )
}

fn render_app_card(record: &ClassificationRecord) -> String {
    let style = record.section.style();
    let platform = record
        .platform
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .unwrap_or("App");
    format!(
        r#"
<div class="glass-card p-8 rounded-[2rem] hover:bg-white/5 transition-all duration-300 reveal active border-t border-white/5 mb-6">
    <div class="flex items-start gap-4">
        <div class="w-12 h-12 rounded-2xl bg-{color}-500/10 flex items-center justify-center shrink-0 border border-{color}-500/20">
            <i class="fas fa-{icon} text-{color}-400 text-lg"></i>
        </div>
        <div class="flex-1">
            <div class="flex justify-between items-start">
                <h3 class="text-lg font-bold text-gray-100 leading-tight mb-2">{name}</h3>
                <span class="text-[9px] font-bold bg-{color}-500 text-black px-2 py-0.5 rounded uppercase tracking-wider">{platform}</span>
            </div>
            <p class="text-sm text-gray-400 leading-relaxed mb-4">{desc}</p>
            <a href="{url}" target="_blank" class="inline-flex items-center gap-2 text-xs font-bold text-white hover:text-{color}-400 transition-colors group">
                DOWNLOAD <i class="fas fa-download group-hover:translate-y-1 transition-transform"></i>
            </a>
        </div>
    </div>
</div>
"#,
        color = style.color,
        icon = style.icon,
        name = html_escape(&record.name),
        platform = html_escape(platform),
        desc = html_escape(&record.desc),
        url = html_escape(&record.url),
    )
}

fn render_generic_card(record: &ClassificationRecord) -> String {
    let style = record.section.style();
    format!(
        r#"
<div class="glass-card p-8 rounded-[2rem] hover:bg-white/5 transition-all duration-300 reveal active border-t border-white/5 mb-6">
    <div class="flex items-start gap-4">
        <div class="w-12 h-12 rounded-2xl bg-{color}-500/10 flex items-center justify-center shrink-0 border border-{color}-500/20">
            <i class="fas fa-{icon} text-{color}-400 text-lg"></i>
        </div>
        <div class="flex-1">
            <div class="flex justify-between items-start">
                <h3 class="text-lg font-bold text-gray-100 leading-tight mb-2">{name}</h3>
                <span class="text-[9px] font-bold bg-{color}-500/20 text-{color}-300 px-2 py-1 rounded uppercase tracking-wider">{section}</span>
            </div>
            <p class="text-sm text-gray-400 leading-relaxed mb-4">{desc}</p>
            <a href="{url}" target="_blank" class="inline-flex items-center gap-2 text-xs font-bold text-white hover:text-{color}-400 transition-colors group">
                OPEN RESOURCE <i class="fas fa-arrow-right group-hover:translate-x-1 transition-transform"></i>
            </a>
        </div>
    </div>
</div>
"#,
        color = style.color,
        icon = style.icon,
        name = html_escape(&record.name),
        section = record.section.as_str(),
        desc = html_escape(&record.desc),
        url = html_escape(&record.url),
    )
}

/// `</div` and friends become `<\/div` so the body cannot close its container
/// even if escaping is ever relaxed.
fn neutralize_closing_tags(s: &str) -> String {
    RE_CLOSING_TAG.replace_all(s, r"<\/${1}${2}").into_owned()
}

pub(crate) fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
