//! Defines [`ContentItem`], the unit handed to the page renderer, along with
//! the URL derivation and previous/next linking that run once the final order
//! of items is known.

use serde::Serialize;

/// A link to a neighboring [`ContentItem`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Ref {
    pub title: String,
    pub url: String,
}

/// A derived, displayable manuscript chapter.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ContentItem {
    /// The id of the [`crate::source::SourceFile`] this item came from.
    pub id: String,

    /// The title taken from the source file's first line.
    pub title: String,

    /// The rendered body. Left out of serialized indexes; the writer stores
    /// it as a separate file.
    #[serde(skip)]
    pub html: String,

    /// A plain-text excerpt of the body.
    pub preview: String,

    /// Position in the final sequence, starting at 0.
    pub order: usize,

    /// This item's relative URL. See [`item_url`].
    pub url: String,

    /// The item at `order - 1`, if any.
    pub previous: Option<Ref>,

    /// The item at `order + 1`, if any.
    pub next: Option<Ref>,
}

impl ContentItem {
    fn to_ref(&self) -> Ref {
        Ref {
            title: self.title.clone(),
            url: self.url.clone(),
        }
    }
}

/// Derives the relative URL for a source file id. The file extension is
/// dropped and the file name's leading `_`-separated segment (its numeric
/// ordering prefix) is removed; directories are kept as they are. A file name
/// without `_` is used whole.
///
/// * `01_getting_started.md` becomes `getting_started`
/// * `part1/02_basics.md` becomes `part1/basics`
/// * `preface.md` becomes `preface`
pub fn item_url(id: &str) -> String {
    let (dir, file_name) = match id.rfind('/') {
        Some(i) => (&id[..=i], &id[i + 1..]),
        None => ("", id),
    };
    let name = match file_name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => file_name,
    };
    let name = match name.split_once('_') {
        Some((_, rest)) if !rest.is_empty() => rest,
        _ => name,
    };
    format!("{}{}", dir, name)
}

/// Sets `previous` and `next` on every item from its neighbors in `items`.
/// `items` must already be in final order.
pub fn link(items: &mut [ContentItem]) {
    let refs: Vec<Ref> = items.iter().map(ContentItem::to_ref).collect();
    for (i, item) in items.iter_mut().enumerate() {
        item.previous = match i {
            0 => None,
            _ => Some(refs[i - 1].clone()),
        };
        item.next = refs.get(i + 1).cloned();
    }
}
