//! HTML fragments for the panel pages.
//!
//! Every fragment that a streaming route replaces carries a stable element id
//! (`remotes-list`, `file-browser`, `jobs-list`, `stats-content`) so updates
//! can target it by selector. Form inputs bind to Datastar signals, which the
//! browser sends back with every action.

use rcpanel_core::{Job, JobState, JobSummary, ListEntry, RemoteConfig, StatsSnapshot, VersionInfo};
use std::fmt::Write;

pub const REMOTES_LIST_ID: &str = "remotes-list";
pub const FILE_BROWSER_ID: &str = "file-browser";
pub const JOBS_LIST_ID: &str = "jobs-list";
pub const STATS_CONTENT_ID: &str = "stats-content";
pub const TRANSFER_STATUS_ID: &str = "transfer-status";

const DATASTAR_SCRIPT: &str =
    "https://cdn.jsdelivr.net/gh/starfederation/datastar@v1.0.0-RC.1/bundles/datastar.js";

pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Escape a value for use inside a single-quoted JS string within an
/// attribute.
fn escape_js(raw: &str) -> String {
    escape_html(&raw.replace('\\', "\\\\").replace('\'', "\\'"))
}

/// Human-readable size in binary units: `512 B`, `1.5 KB`, `2.0 GB`.
pub fn format_size(bytes: i64) -> String {
    const UNIT: i64 = 1024;
    if bytes < UNIT {
        return format!("{} B", bytes);
    }
    let mut div = UNIT;
    let mut exp = 0;
    let mut n = bytes / UNIT;
    while n >= UNIT && exp < 5 {
        div *= UNIT;
        exp += 1;
        n /= UNIT;
    }
    let prefix = ['K', 'M', 'G', 'T', 'P', 'E'][exp];
    format!("{:.1} {}B", bytes as f64 / div as f64, prefix)
}

/// Element id from a prefix and arbitrary text (remote names, paths).
///
/// ASCII letters, digits and `-` are kept; every other byte, `_` included,
/// becomes `_` plus two hex digits, so distinct names never share an id.
pub fn dom_id(prefix: &str, raw: &str) -> String {
    let mut id = String::with_capacity(prefix.len() + 1 + raw.len());
    id.push_str(prefix);
    id.push('-');
    for b in raw.bytes() {
        if b.is_ascii_alphanumeric() || b == b'-' {
            id.push(b as char);
        } else {
            let _ = write!(id, "_{:02x}", b);
        }
    }
    id
}

/// Parent of a slash-separated path; the root's parent is the root.
pub fn parent_path(path: &str) -> &str {
    path.trim_end_matches('/')
        .rsplit_once('/')
        .map(|(parent, _)| parent)
        .unwrap_or("")
}

/// `data-signals` attribute value seeding the given signals.
fn signals_attr(signals: serde_json::Value) -> String {
    escape_html(&signals.to_string())
}

fn join_path(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", dir.trim_end_matches('/'), name)
    }
}

fn layout(title: &str, active: &str, body: &str) -> String {
    let nav = [("/", "Remotes"), ("/jobs", "Jobs"), ("/stats", "Stats")]
        .iter()
        .map(|(href, label)| {
            let class = if *href == active { r#" class="active""# } else { "" };
            format!(r#"<a href="{}"{}>{}</a>"#, href, class, label)
        })
        .collect::<String>();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title} - rcpanel</title>
<script type="module" src="{script}"></script>
</head>
<body>
<nav>{nav}</nav>
<div id="errors"></div>
<main>
{body}
</main>
</body>
</html>"#,
        title = escape_html(title),
        script = DATASTAR_SCRIPT,
        nav = nav,
        body = body,
    )
}

// ---------------------------------------------------------------------------
// Remotes
// ---------------------------------------------------------------------------

pub fn remotes_page(remotes: &[RemoteConfig]) -> String {
    let body = format!(
        r#"<h1>Remotes</h1>
<button data-on-click="@get('/api/remotes/refresh')">Refresh</button>
{}
{}
<div id="{}"></div>"#,
        remotes_list(remotes),
        transfer_form(),
        FILE_BROWSER_ID,
    );
    layout("Remotes", "/", &body)
}

/// Copy or move between two remotes, started as an engine job.
fn transfer_form() -> String {
    let signals = signals_attr(serde_json::json!({
        "srcRemote": "",
        "srcPath": "",
        "dstRemote": "",
        "dstPath": "",
        "mode": "copy",
    }));
    format!(
        r#"<section class="transfer" data-signals="{signals}">
<h2>Transfer</h2>
<input data-bind-src-remote placeholder="Source remote"> <input data-bind-src-path placeholder="Source path">
<input data-bind-dst-remote placeholder="Destination remote"> <input data-bind-dst-path placeholder="Destination path">
<select data-bind-mode><option value="copy">Copy</option><option value="move">Move</option></select>
<button data-on-click="@post('/api/transfers')">Start</button>
<div id="{status}"></div>
</section>"#,
        signals = signals,
        status = TRANSFER_STATUS_ID,
    )
}

pub fn remotes_list(remotes: &[RemoteConfig]) -> String {
    if remotes.is_empty() {
        return format!(r#"<div id="{}"><p class="empty">No remotes configured</p></div>"#, REMOTES_LIST_ID);
    }

    let mut out = format!(r#"<div id="{}"><ul>"#, REMOTES_LIST_ID);
    for remote in remotes {
        let name = urlencoding::encode(&remote.name);
        let _ = write!(
            out,
            r#"<li id="{id}"><span class="name">{label}</span> <span class="type">{kind}</span> <button data-on-click="@get('/api/remotes/{name}/browse')">Browse</button> <button data-on-click="@delete('/api/remotes/{name}')">Delete</button></li>"#,
            id = dom_id("remote", &remote.name),
            label = escape_html(&remote.name),
            kind = escape_html(&remote.remote_type),
            name = escape_js(&name),
        );
    }
    out.push_str("</ul></div>");
    out
}

/// Directory listing of `path` on `remote`, with an up-link when not at the root.
pub fn file_browser(remote: &str, path: &str, entries: &[ListEntry]) -> String {
    let base = format!("/api/remotes/{}", urlencoding::encode(remote));
    let browse = |target: &str| {
        escape_js(&format!("{}/browse?path={}", base, urlencoding::encode(target)))
    };

    let mut out = format!(
        r#"<div id="{}" data-signals="{}"><h2>{}:{}</h2>"#,
        FILE_BROWSER_ID,
        signals_attr(serde_json::json!({ "path": path, "dir": "" })),
        escape_html(remote),
        escape_html(path)
    );
    let _ = write!(
        out,
        r#"<div class="mkdir"><input data-bind-dir placeholder="New folder"> <button data-on-click="@post('{}')">Create</button></div><ul>"#,
        escape_js(&format!("{}/mkdir", base))
    );
    if !path.is_empty() {
        let _ = write!(
            out,
            r#"<li class="up"><a data-on-click="@get('{}')">..</a></li>"#,
            browse(parent_path(path))
        );
    }
    for entry in entries {
        let full = join_path(path, &entry.name);
        let id = dom_id("entry", &full);
        let label = escape_html(&entry.name);
        let delete = escape_js(&format!(
            "{}/entry?path={}&dir={}",
            base,
            urlencoding::encode(&full),
            entry.is_dir
        ));
        if entry.is_dir {
            let _ = write!(
                out,
                r#"<li id="{id}" class="dir"><a data-on-click="@get('{open}')">{label}/</a> <button data-on-click="@delete('{delete}')">Delete</button></li>"#,
                open = browse(&full),
            );
        } else {
            let _ = write!(
                out,
                r#"<li id="{id}" class="file">{label} <span class="size">{size}</span> <span class="modtime">{modtime}</span> <button data-on-click="@delete('{delete}')">Delete</button></li>"#,
                size = format_size(entry.size_bytes),
                modtime = escape_html(&entry.mod_time),
            );
        }
    }
    out.push_str("</ul></div>");
    out
}

// ---------------------------------------------------------------------------
// Jobs
// ---------------------------------------------------------------------------

pub fn jobs_page(jobs: &[Job]) -> String {
    let body = format!(
        r#"<h1>Jobs</h1>
<div data-on-load="@get('/api/jobs/refresh?watch=true')"></div>
{}"#,
        jobs_list(jobs)
    );
    layout("Jobs", "/jobs", &body)
}

pub fn jobs_list(jobs: &[Job]) -> String {
    let summary = JobSummary::from_jobs(jobs);
    let mut out = format!(
        r#"<div id="{}"><p class="summary">{} running, {} finished, {} failed</p>"#,
        JOBS_LIST_ID, summary.pending, summary.succeeded, summary.failed
    );
    if jobs.is_empty() {
        out.push_str(r#"<p class="empty">No jobs</p></div>"#);
        return out;
    }

    out.push_str("<table><tr><th>ID</th><th>Group</th><th>Started</th><th>Status</th><th></th></tr>");
    for job in jobs {
        out.push_str(&job_row(job));
    }
    out.push_str("</table></div>");
    out
}

pub fn job_row(job: &Job) -> String {
    let state = job.state();
    let action = match state {
        JobState::Pending => format!(
            r#"<button data-on-click="@post('/api/jobs/{}/stop')">Stop</button>"#,
            job.id
        ),
        _ => String::new(),
    };
    let status = match (&job.error, state) {
        (Some(err), JobState::Failed) => format!("{}: {}", state.label(), escape_html(err)),
        _ => state.label().to_string(),
    };
    format!(
        r#"<tr id="job-{id}" class="{label}"><td>{id}</td><td>{group}</td><td>{start}</td><td>{status}</td><td>{action}</td></tr>"#,
        id = job.id,
        label = state.label(),
        group = escape_html(&job.group),
        start = escape_html(&job.start_time),
        status = status,
        action = action,
    )
}

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

pub fn stats_page(stats: &StatsSnapshot, version: &VersionInfo) -> String {
    let body = format!(
        r#"<h1>Stats</h1>
<div data-on-load="@get('/api/stats/stream')"></div>
{}"#,
        stats_content(stats, version)
    );
    layout("Stats", "/stats", &body)
}

pub fn stats_content(stats: &StatsSnapshot, version: &VersionInfo) -> String {
    let rows = [
        ("Transferred", format_size(stats.bytes_transferred as i64)),
        ("Speed", format!("{}/s", format_size(stats.speed_bytes_per_sec as i64))),
        ("ETA", format!("{:.0}s", stats.eta_seconds)),
        ("Elapsed", format!("{:.1}s", stats.elapsed_seconds)),
        ("Transfers", format!("{} / {}", stats.transfers, stats.total_transfers)),
        ("Checks", format!("{} / {}", stats.checks, stats.total_checks)),
        ("Errors", stats.errors.to_string()),
        ("Deletes", stats.deletes.to_string()),
    ];

    let mut out = format!(r#"<div id="{}"><dl>"#, STATS_CONTENT_ID);
    for (label, value) in rows {
        let _ = write!(out, "<dt>{}</dt><dd>{}</dd>", label, value);
    }
    let _ = write!(
        out,
        r#"</dl><p class="version">rclone {} ({}, {}/{})</p></div>"#,
        escape_html(&version.version),
        escape_html(&version.runtime_version),
        escape_html(&version.os),
        escape_html(&version.arch),
    );
    out
}
