// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Server-rendered chat page
//!
//! User-supplied text (question, filename, error text) is escaped here. Bot
//! messages are HTML produced by [`crate::answer`] and are inserted as-is.

use ammonia::clean_text as escape;

use crate::session::settings::{
    CHUNK_OVERLAP_RANGE, CHUNK_SIZE_RANGE, K_RESULTS_RANGE, MIN_RELEVANCE_RANGE,
};
use crate::session::{ChatMessage, Role, Session};

pub const PAGE_TITLE: &str = "Чат с конспектом";
pub const WELCOME_TEXT: &str = "Загрузите PDF-файл в меню слева";
pub const EMPTY_CHAT_TEXT: &str = "Введите вопрос, чтобы начать диалог";

const STYLE: &str = r#"
    body { background: #f9fafb; font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; margin: 0; display: flex; min-height: 100vh; }
    .sidebar { width: 280px; background: #ffffff; border-right: 1px solid #e5e7eb; padding: 1.5rem; box-sizing: border-box; }
    .sidebar-title { font-size: 0.9rem; font-weight: 500; color: #6b7280; text-transform: uppercase; letter-spacing: 0.05em; margin-bottom: 1.5rem; }
    .main-container { flex: 1; max-width: 1200px; margin: 0 auto; padding: 2rem; }
    .header { margin-bottom: 2rem; }
    .header h1 { font-size: 1.8rem; font-weight: 500; color: #111827; margin: 0; }
    .header p { color: #6b7280; font-size: 0.9rem; margin: 0.25rem 0 0; }
    .stats-grid { display: grid; grid-template-columns: repeat(4, 1fr); gap: 0.75rem; margin: 1.5rem 0; padding: 1rem; background: #ffffff; border-radius: 12px; border: 1px solid #e5e7eb; }
    .stat-card { text-align: center; }
    .stat-value { font-size: 1.25rem; font-weight: 500; color: #111827; }
    .stat-label { font-size: 0.7rem; color: #9ca3af; margin-top: 0.25rem; }
    .file-info { background: #f9fafb; border-radius: 8px; padding: 0.75rem 1rem; margin: 1rem 0; border: 1px solid #e5e7eb; }
    .file-info .filename { font-weight: 500; color: #111827; word-break: break-all; }
    .user-message { display: flex; justify-content: flex-end; margin-bottom: 1.5rem; }
    .user-message-content { background: #eef2ff; color: #1f2937; padding: 0.75rem 1rem; border-radius: 12px 12px 4px 12px; max-width: 70%; font-size: 0.95rem; }
    .bot-message { display: flex; justify-content: flex-start; margin-bottom: 1.5rem; }
    .bot-message-content { background: #ffffff; color: #1f2937; padding: 0.75rem 1rem; border-radius: 12px 12px 12px 4px; max-width: 70%; border: 1px solid #e5e7eb; font-size: 0.95rem; }
    .message-time { font-size: 0.65rem; color: #9ca3af; margin-top: 0.25rem; text-align: right; }
    .result-card { background: #ffffff; border-radius: 8px; padding: 1rem; margin-bottom: 1rem; border: 1px solid #eaeef2; }
    .result-meta { display: flex; gap: 1rem; margin-bottom: 0.5rem; font-size: 0.75rem; color: #6b7280; }
    .result-content { color: #1f2937; font-size: 0.9rem; line-height: 1.5; }
    .welcome-message { text-align: center; padding: 3rem 2rem; background: #f9fafb; border-radius: 8px; border: 1px dashed #d1d5db; margin: 2rem 0; }
    .welcome-icon { font-size: 2.5rem; margin-bottom: 1rem; opacity: 0.5; }
    .welcome-text { color: #6b7280; font-size: 0.9rem; }
    .empty-chat { text-align: center; color: #9ca3af; padding: 2rem; }
    .notification { padding: 0.75rem 1rem; border-radius: 8px; margin: 1rem 0; font-size: 0.9rem; }
    .notification-error { background: #fef2f2; color: #b91c1c; border: 1px solid #fecaca; }
    .messages-container { margin: 1.5rem 0; }
    .ask-form { display: flex; gap: 0.5rem; }
    .ask-form input[type=text] { flex: 6; border-radius: 8px; border: 1px solid #d1d5db; padding: 0.6rem 1rem; font-size: 0.95rem; }
    button { background: #ffffff; color: #374151; border: 1px solid #d1d5db; border-radius: 6px; padding: 0.4rem 0.8rem; font-size: 0.85rem; width: 100%; cursor: pointer; }
    button:hover { background: #f9fafb; border-color: #9ca3af; }
    .ask-form button { flex: 1; }
    details { margin: 1rem 0; }
    label { display: block; font-size: 0.8rem; color: #374151; margin-top: 0.75rem; }
    input[type=range] { width: 100%; }
    .footer { text-align: center; color: #9ca3af; font-size: 0.75rem; margin-top: 2rem; padding-top: 1rem; border-top: 1px solid #e5e7eb; }
"#;

/// Render the full page for the current session state
pub fn render_page(session: &Session) -> String {
    let mut main = String::new();

    main.push_str(&format!(
        r#"<div class="header"><h1>{}</h1><p>Задайте вопрос по загруженному документу</p></div>"#,
        PAGE_TITLE
    ));

    if let Some(error) = session.error_message() {
        main.push_str(&format!(
            r#"<div class="notification notification-error">{}</div>"#,
            escape(error)
        ));
    }

    match session.stats() {
        None => main.push_str(&format!(
            r#"<div class="welcome-message"><div class="welcome-icon">📄</div><div class="welcome-text">{}</div></div>"#,
            WELCOME_TEXT
        )),
        Some(stats) => {
            main.push_str(&format!(
                r#"<div class="stats-grid">
<div class="stat-card"><div class="stat-value">{}</div><div class="stat-label">страниц</div></div>
<div class="stat-card"><div class="stat-value">{}</div><div class="stat-label">фрагментов</div></div>
<div class="stat-card"><div class="stat-value">{}</div><div class="stat-label">символов</div></div>
<div class="stat-card"><div class="stat-value">{}</div><div class="stat-label">ср. длина</div></div>
</div>"#,
                stats.pages,
                stats.fragments,
                stats.total_chars_display(),
                stats.avg_len
            ));
            main.push_str(&render_messages(session.chat_history()));
            main.push_str(
                r#"<form class="ask-form" method="post" action="/ask">
<input type="text" name="question" placeholder="Введите вопрос..." autocomplete="off" autofocus>
<button type="submit">→</button>
</form>"#,
            );
        }
    }

    main.push_str(r#"<div class="footer">Чат-бот для конспектов</div>"#);

    format!(
        r#"<!DOCTYPE html>
<html lang="ru">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title>
<style>{style}</style>
</head>
<body>
<aside class="sidebar">{sidebar}</aside>
<main class="main-container">{main}</main>
</body>
</html>"#,
        title = PAGE_TITLE,
        style = STYLE,
        sidebar = render_sidebar(session),
        main = main,
    )
}

fn render_sidebar(session: &Session) -> String {
    let mut html = String::from(r#"<div class="sidebar-title">Настройки</div>"#);

    match session.pdf_filename() {
        Some(filename) => html.push_str(&format!(
            r#"<div class="file-info"><div class="filename">📄 {}</div></div>"#,
            escape(filename)
        )),
        None => html.push_str(
            r#"<form method="post" action="/upload" enctype="multipart/form-data">
<label for="file">Загрузите PDF</label>
<input type="file" id="file" name="file" accept=".pdf,application/pdf" required>
<button type="submit">Загрузить</button>
</form>"#,
        ),
    }

    if session.is_ready() {
        let settings = session.settings();
        html.push_str(&format!(
            r#"<details><summary>Параметры</summary>
<form method="post" action="/settings">
<label>Результатов <input type="range" name="k_results" min="{k_min}" max="{k_max}" step="1" value="{k}"></label>
<label>Мин. совпадение <input type="range" name="min_relevance" min="{r_min}" max="{r_max}" step="0.05" value="{r}"></label>
<label>Размер фрагмента <input type="range" name="chunk_size" min="{s_min}" max="{s_max}" step="50" value="{s}"></label>
<label>Перекрытие <input type="range" name="chunk_overlap" min="{o_min}" max="{o_max}" step="10" value="{o}"></label>
<label>Макс. фрагментов <input type="number" name="max_chunks" min="1" value="{m}"></label>
<button type="submit">Применить</button>
</form>
</details>"#,
            k_min = K_RESULTS_RANGE.start(),
            k_max = K_RESULTS_RANGE.end(),
            k = settings.k_results,
            r_min = MIN_RELEVANCE_RANGE.start(),
            r_max = MIN_RELEVANCE_RANGE.end(),
            r = settings.min_relevance,
            s_min = CHUNK_SIZE_RANGE.start(),
            s_max = CHUNK_SIZE_RANGE.end(),
            s = settings.chunk_size,
            o_min = CHUNK_OVERLAP_RANGE.start(),
            o_max = CHUNK_OVERLAP_RANGE.end(),
            o = settings.chunk_overlap,
            m = settings.max_chunks,
        ));
    }

    html.push_str(
        r#"<form method="post" action="/clear"><button type="submit">🗑️ Очистить всё</button></form>"#,
    );
    html
}

fn render_messages(messages: &[ChatMessage]) -> String {
    if messages.is_empty() {
        return format!(r#"<div class="empty-chat">{}</div>"#, EMPTY_CHAT_TEXT);
    }

    let mut html = String::from(r#"<div class="messages-container">"#);
    for message in messages {
        let (class, content) = match message.role {
            Role::User => ("user", escape(&message.content)),
            Role::Bot => ("bot", message.content.clone()),
        };
        html.push_str(&format!(
            r#"<div class="{class}-message"><div class="{class}-message-content">{content}<div class="message-time">{time}</div></div></div>"#,
            class = class,
            content = content,
            time = escape(&message.time),
        ));
    }
    html.push_str("</div>");
    html
}
