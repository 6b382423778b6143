//! Turning command-line arguments into an ordered page list

use std::cmp::Ordering;
use std::path::Path;

use anyhow::{Result, bail};
use log::{debug, warn};
use walkdir::WalkDir;

use crate::loader::PageSource;

/// File extensions picked up when expanding a directory
pub const PAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp"];

pub fn is_page_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            PAGE_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}

/// Expand arguments into page sources, keeping argument order.
///
/// URIs (`data:`, `file://`) and files are taken as given. Directories are
/// walked recursively and contribute their image files in natural order, so
/// `page2.png` comes before `page10.png`.
pub fn collect_sources<S: AsRef<str>>(args: &[S]) -> Result<Vec<PageSource>> {
    let mut sources = Vec::new();

    for arg in args {
        let arg = arg.as_ref();
        if arg.starts_with("data:") || arg.starts_with("file://") {
            sources.push(PageSource::from(arg));
            continue;
        }

        let path = Path::new(arg);
        if path.is_dir() {
            let before = sources.len();
            sources.extend(pages_in_dir(path));
            debug!("Found {} pages in {path:?}", sources.len() - before);
            if sources.len() == before {
                warn!("No page images in {path:?}");
            }
        } else if path.is_file() {
            sources.push(PageSource::from(path));
        } else {
            bail!("No such file or directory: {arg}");
        }
    }

    if sources.is_empty() {
        bail!("No page images found");
    }
    Ok(sources)
}

fn pages_in_dir(dir: &Path) -> impl Iterator<Item = PageSource> {
    WalkDir::new(dir)
        .follow_links(true)
        .sort_by(|a, b| {
            natural_cmp(
                &a.file_name().to_string_lossy(),
                &b.file_name().to_string_lossy(),
            )
        })
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.'))
        .filter_map(|entry| entry.ok())
        .filter(|e| e.file_type().is_file() && is_page_file(e.path()))
        .map(|e| PageSource::from(e.path()))
}

/// Compare names so that embedded numbers order by value.
///
/// Text compares case-insensitively; ties fall back to a plain comparison.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut left = a.chars().peekable();
    let mut right = b.chars().peekable();

    loop {
        match (left.peek().copied(), right.peek().copied()) {
            (None, None) => return a.cmp(b),
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(l), Some(r)) if l.is_ascii_digit() && r.is_ascii_digit() => {
                let l_run = take_digits(&mut left);
                let r_run = take_digits(&mut right);
                let l_num = l_run.trim_start_matches('0');
                let r_num = r_run.trim_start_matches('0');
                let ord = l_num
                    .len()
                    .cmp(&r_num.len())
                    .then_with(|| l_num.cmp(r_num));
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            (Some(l), Some(r)) => {
                let ord = l.to_lowercase().cmp(r.to_lowercase());
                if ord != Ordering::Equal {
                    return ord;
                }
                left.next();
                right.next();
            }
        }
    }
}

fn take_digits(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut run = String::new();
    while let Some(c) = chars.next_if(char::is_ascii_digit) {
        run.push(c);
    }
    run
}
