//! Glyphs shown in front of tree rows and quick-open results.
//!
//! With icons enabled, Nerd Font code points are used; otherwise a short
//! ASCII marker keeps directories distinguishable.

use std::path::Path;

use crate::app::RowKind;

/// Prefix for a tree row.
pub fn row_icon(kind: RowKind, name: &str, expanded: bool, nerd_font: bool) -> &'static str {
    match (kind, nerd_font) {
        (RowKind::Repository, true) => "\u{e702} ",
        (RowKind::Directory, true) if expanded => "\u{f07c} ",
        (RowKind::Directory, true) => "\u{f07b} ",
        (RowKind::File, true) => file_icon(name),
        (RowKind::Repository | RowKind::Directory, false) if expanded => "v ",
        (RowKind::Repository | RowKind::Directory, false) => "> ",
        (RowKind::File, false) => "  ",
    }
}

/// Nerd Font glyph for a file, by well-known name first and then by extension.
pub fn file_icon(name: &str) -> &'static str {
    let lower = name.to_lowercase();
    let by_name = match lower.as_str() {
        "makefile" | "gnumakefile" | "cmakelists.txt" => Some("\u{e779} "),
        "dockerfile" => Some("\u{f308} "),
        "cargo.toml" | "cargo.lock" => Some("\u{e7a8} "),
        ".gitignore" | ".gitmodules" | ".gitattributes" => Some("\u{e702} "),
        "license" | "copying" => Some("\u{f0219} "),
        "readme" | "readme.md" => Some("\u{e73e} "),
        _ => None,
    };
    if let Some(icon) = by_name {
        return icon;
    }

    let ext = Path::new(&lower)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("");
    match ext {
        "rs" => "\u{e7a8} ",
        "c" | "h" => "\u{e61e} ",
        "cpp" | "cc" | "cxx" | "hpp" | "hxx" => "\u{e61d} ",
        "py" => "\u{e73c} ",
        "js" | "mjs" => "\u{e74e} ",
        "ts" | "tsx" => "\u{e628} ",
        "go" => "\u{e724} ",
        "java" => "\u{e738} ",
        "lua" => "\u{e620} ",
        "sh" | "bash" | "zsh" => "\u{f489} ",
        "toml" | "ini" | "cfg" | "conf" => "\u{e615} ",
        "yaml" | "yml" => "\u{e6a8} ",
        "json" => "\u{e60b} ",
        "xml" | "ui" | "glade" => "\u{e619} ",
        "md" | "markdown" => "\u{e73e} ",
        "txt" => "\u{f15c} ",
        "png" | "jpg" | "jpeg" | "gif" | "svg" | "ico" => "\u{f1c5} ",
        "po" | "pot" => "\u{f1ab} ",
        _ => "\u{f15b} ",
    }
}
