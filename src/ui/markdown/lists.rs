#[derive(Clone, Debug)]
pub(super) enum ListKind {
    Unordered,
    Ordered(u64),
}

/// One open list: its kind and the width of the marker of its current item.
#[derive(Clone, Debug)]
pub(super) struct ListLevel {
    pub(super) kind: ListKind,
    pub(super) marker_width: usize,
}

impl ListLevel {
    pub(super) fn new(start: Option<u64>) -> Self {
        Self {
            kind: match start {
                Some(n) => ListKind::Ordered(n),
                None => ListKind::Unordered,
            },
            marker_width: 0,
        }
    }

    /// Marker for the next item; ordered lists count up from their start.
    pub(super) fn next_marker(&mut self) -> String {
        let marker = match &mut self.kind {
            ListKind::Unordered => "• ".to_string(),
            ListKind::Ordered(n) => {
                let marker = format!("{n}. ");
                *n += 1;
                marker
            }
        };
        self.marker_width = unicode_width::UnicodeWidthStr::width(marker.as_str());
        marker
    }
}
