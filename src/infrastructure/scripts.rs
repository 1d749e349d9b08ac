//! 页面脚本与选择器
//!
//! 站点改版时只需要改这里。

pub const SIGNIN_BUTTON: &str = "#signin_btn";
pub const LOGIN_INPUT: &str = "input[name='login']";
pub const PASSWORD_INPUT: &str = "input[name='password']";
pub const LOGGED_IN_MARKER: &str = ".account-icon__3u4B";
pub const LOGGED_OUT_MARKER: &str = "a[href='/accounts/login/']";
pub const AFTER_LOGIN_MARKER: &str = ".notification-btn-container__23CT";

pub const QUESTION_CONTENT: &str = ".content__3fR6";
pub const QUESTION_SIDE_TOOLS: &str = ".side-tools-wrapper__1TS9";
pub const QUESTION_TITLE: &str = "div[data-cy='question-title']";
pub const LANGUAGE_COMBOBOX: &str = "div[role='combobox']";
pub const LANGUAGE_OPTIONS: &str = "li[data-cy^=lang-select]";

pub const SOLUTION_CONTENT: &str = ".content__QRGW";
pub const SOLUTION_DISABLED_TAB: &str = "div[disabled] span.title__3f2k";
/// 题解正文里的代码块（不含评论区）
pub const SOLUTION_FRAMES: &str = ".content__QRGW > *:not(.root__3XxC) iframe[src^='https://leetcode.com/']";
/// 评论区里的代码块
pub const COMMENT_FRAMES: &str = ".content__QRGW > .root__3XxC iframe[src^='https://leetcode.com/']";

pub const READ_MORE: &str =
    "div[data-is-show-read-more='true'] div[data-is-beyond-limit-size='true'] .read-more__3UuG";
pub const SHOW_REPLIES: &str = ".action__1C-I span";
pub const QUESTION_EXTRAS: &str = ".css-isal7m .css-blecvm.e5i1odf0";

/// 打印背景时滚动条会留下一条横线
pub const HIDE_SCROLLBAR: &str = r#"
(() => {
    const style = document.createElement('style');
    style.innerText = '::-webkit-scrollbar-thumb { background: none; }';
    document.head.appendChild(style);
})()
"#;

/// 题目页上与正文无关的元素
pub const QUESTION_BOILERPLATE: &[&str] = &[
    ".container__2WTi",
    ".question-picker-detail__Rehh",
    ".global-clipboard-container",
    ".btns__1OeZ",
    ".editor-wrapper__1ru6",
    ".header__3STC",
    ".question-fast-picker-wrapper__2Y97",
    ".css-5wdlwo-TabViewHeader",
    ".erd_scroll_detection_container",
    ".note__1Qo7",
    ".resize-bar__2_sK",
];

/// 题解页上与正文无关的元素
pub const SOLUTION_BOILERPLATE: &[&str] = &[
    ".editor-wrapper__1ru6",
    ".header__3STC",
    ".pagination-container__px42",
    ".question-fast-picker-wrapper__2Y97",
    ".css-5wdlwo-TabViewHeader",
    ".nav__1n5p",
    ".comment__4GKl",
    ".editor__2AvG",
    ".community-rules__25MG",
    ".erd_scroll_detection_container",
    ".note__1Qo7",
    ".resize-bar__2_sK",
    ".copy-code-btn",
    "p a.report-link__1eJM",
];

/// 删除所有匹配的元素
pub fn remove_all(selectors: &[&str]) -> String {
    let joined = selectors.join(", ");
    format!(
        "document.querySelectorAll({}).forEach(el => el.remove());",
        json_str(&joined)
    )
}

/// 删除文字完全相同的元素的父节点（"Add to List"、"Share" 等按钮）
pub fn remove_parent_by_text(tag: &str, text: &str) -> String {
    format!(
        "Array.from(document.querySelectorAll({})).filter(el => el.textContent === {}).forEach(el => el.parentNode && el.parentNode.remove());",
        json_str(tag),
        json_str(text)
    )
}

/// 把编辑器挪进题目正文，然后只保留正文
pub fn isolate_question(width: u32) -> String {
    format!(
        r#"
(() => {{
    const editorParent = document.querySelector('.content__u3I1.question-content__JfgR');
    const editor = document.querySelector('.wrapper__1Diw.editor__DNsS');
    if (editorParent && editor) editorParent.appendChild(editor);
    const mirror = document.querySelector('.CodeMirror.cm-s-textmate.CodeMirror-wrap');
    if (mirror) {{ mirror.style.position = 'relative'; mirror.style.height = 'auto'; }}
    const app = document.getElementById('app');
    const description = document.querySelector('div[data-key="description-content"]');
    if (!app || !description) return false;
    const content = description.parentNode;
    app.style.height = 'auto';
    app.innerHTML = '';
    app.appendChild(content);
    app.style.maxWidth = '{width}px';
    app.style.width = '{width}px';
    description.style.display = 'block';
    description.style.border = 'none';
    document.body.style.overflow = 'scroll';
    return true;
}})()
"#
    )
}

/// 题解页只保留正文区域
pub fn isolate_solution(width: u32) -> String {
    format!(
        r#"
(() => {{
    const main = document.querySelector('.main__2_tD');
    const content = document.querySelector('{content}');
    if (!main || !content) return false;
    if (content.parentNode !== main) {{
        main.innerHTML = '';
        main.appendChild(content);
    }}
    main.style.maxWidth = '{width}px';
    main.style.width = '{width}px';
    main.style.position = 'static';
    const layout = document.querySelector('.layout__3fIJ');
    if (layout) {{ layout.style.overflow = 'scroll'; layout.style.position = 'static'; }}
    document.body.style.overflow = 'scroll';
    return true;
}})()
"#,
        content = SOLUTION_CONTENT
    )
}

/// 评论区代码块需要的宽度
pub const COMMENTS_WIDTH: &str = r#"
(() => {
    const content = document.querySelector('.content__QRGW');
    const base = content ? content.clientWidth : 0;
    const codes = Array.from(document.querySelectorAll('.comment__3raU pre code'))
        .map(x => x.getBoundingClientRect().right);
    const widest = codes.length ? Math.max(...codes) + 90 : 0;
    return Math.round(Math.max(base, widest));
})()
"#;

pub fn set_comments_width(width: u32) -> String {
    format!(
        r#"
(() => {{
    for (const sel of ['.main__2_tD', '#app']) {{
        const el = document.querySelector(sel);
        if (el) {{ el.style.maxWidth = '{width}px'; el.style.width = '{width}px'; }}
    }}
    const header = document.querySelector('.header___QdN');
    if (header && header.parentNode.previousSibling) {{
        const prev = header.parentNode.previousSibling;
        prev.style.display = 'none';
        if (prev.previousSibling && prev.previousSibling.style) prev.previousSibling.style.display = 'none';
    }}
}})()
"#
    )
}

/// 读取第 `index` 个代码块的语言标签
///
/// 返回 `{ state: "ok" | "empty" | "pending" | "missing", tabs: [...] }`
pub fn frame_tabs(frames_selector: &str, index: usize) -> String {
    format!(
        r#"
(() => {{
    const frame = document.querySelectorAll({sel})[{index}];
    if (!frame) return {{ state: 'missing', tabs: [] }};
    const doc = frame.contentDocument;
    if (!doc) return {{ state: 'pending', tabs: [] }};
    const buttons = Array.from(doc.querySelectorAll('.lang-btn-set button.btn'));
    if (buttons.length > 0) return {{ state: 'ok', tabs: buttons.map(b => b.textContent.trim()) }};
    if (doc.querySelector('.playground-mini-base.text-center.unavailable')) return {{ state: 'empty', tabs: [] }};
    return {{ state: 'pending', tabs: [] }};
}})()
"#,
        sel = json_str(frames_selector),
        index = index
    )
}

/// 在代码块里切到指定语言，并把 iframe 撑到内容高度
pub fn frame_select(frames_selector: &str, index: usize, language: &str) -> String {
    format!(
        r#"
(() => {{
    const frame = document.querySelectorAll({sel})[{index}];
    if (!frame || !frame.contentDocument) return {{ ok: false, reason: 'frame not accessible' }};
    const doc = frame.contentDocument;
    const buttons = Array.from(doc.querySelectorAll('.lang-btn-set button.btn'));
    const target = buttons.find(b => b.textContent.trim() === {lang});
    if (!target) return {{ ok: false, reason: 'language tab not found' }};
    target.click();
    buttons.forEach(b => b.style.display = (b === target ? 'inline-block' : 'none'));
    doc.querySelectorAll('.CodeMirror-vscrollbar, .CodeMirror-hscrollbar').forEach(el => el.remove());
    doc.querySelectorAll('.CodeMirror-scroll, .CodeMirror-wrap, .ReactCodeMirror, .editor, .editor-base, .playground-mini-base.snippet-mode, #app')
        .forEach(el => el.style.height = 'auto');
    const app = doc.querySelector('#app');
    const height = app ? app.clientHeight : 0;
    frame.style.height = (height + 50) + 'px';
    return {{ ok: true, reason: '' }};
}})()
"#,
        sel = json_str(frames_selector),
        index = index,
        lang = json_str(language)
    )
}

/// 评论区代码块：去掉滚动条并撑开高度
pub fn clean_comment_frames() -> String {
    format!(
        r#"
(() => {{
    const frames = Array.from(document.querySelectorAll({sel})).reverse();
    frames.forEach(frame => {{
        const doc = frame.contentDocument;
        if (!doc) return;
        doc.querySelectorAll('.CodeMirror-vscrollbar, .CodeMirror-hscrollbar').forEach(el => el.remove());
        doc.querySelectorAll('.CodeMirror-scroll, .CodeMirror-wrap, .ReactCodeMirror, .editor, .editor-base, #app')
            .forEach(el => el.style.height = 'auto');
        const app = doc.querySelector('#app');
        if (app) frame.style.height = (app.clientHeight + 50) + 'px';
    }});
    return frames.length;
}})()
"#,
        sel = json_str(COMMENT_FRAMES)
    )
}

/// 点击过的可展开元素打上这个标记，避免来回折叠
pub const EXPANDED_MARK: &str = "data-harvest-expanded";

/// 可展开元素的查询表达式（返回数组，倒序点击）
pub fn expansion_query(selector: &str, text_prefix: Option<&str>) -> String {
    let filter = match text_prefix {
        Some(prefix) => format!(".filter(el => el.textContent.startsWith({}))", json_str(prefix)),
        None => String::new(),
    };
    format!(
        "Array.from(document.querySelectorAll({})){}.filter(el => !el.hasAttribute('{}') && !el.querySelector('.lock-icon__1hmE')).reverse()",
        json_str(selector),
        filter,
        EXPANDED_MARK
    )
}

fn json_str(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| "\"\"".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remove_all_quotes_selectors() {
        let js = remove_all(&[".a", "p a.b"]);
        assert_eq!(
            js,
            r#"document.querySelectorAll(".a, p a.b").forEach(el => el.remove());"#
        );
    }

    #[test]
    fn test_frame_select_escapes_language() {
        let js = frame_select(SOLUTION_FRAMES, 2, "C\"#");
        assert!(js.contains(r##""C\"#""##));
        assert!(js.contains("[2]"));
    }

    #[test]
    fn test_expansion_query_with_prefix() {
        let js = expansion_query(SHOW_REPLIES, Some("Show "));
        assert!(js.contains(r#"startsWith("Show ")"#));
        assert!(js.contains(EXPANDED_MARK));
    }
}
