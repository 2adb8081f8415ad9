//! Floating info card: what it says and where it goes on screen

use glam::DVec3;

/// What the hovered pin's card shows.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PopupStyle {
    /// Country name only, not interactive.
    CountryLabel,
    /// A profile from the roster, with prev/next paging.
    ProfileCard,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PopupContent {
    Country(String),
    Profile { index: usize },
}

/// Popup anchored above a pin, in world space.
#[derive(Clone, Debug, PartialEq)]
pub struct Popup {
    pub position: DVec3,
    pub content: PopupContent,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Profile {
    pub name: &'static str,
    pub team: &'static str,
    pub country: &'static str,
}

pub const ROSTER: [Profile; 6] = [
    Profile { name: "Kylian Mbappé", team: "PSG", country: "France" },
    Profile { name: "Stephen Curry", team: "Golden State", country: "USA" },
    Profile { name: "Virat Kohli", team: "India", country: "India" },
    Profile { name: "Lionel Messi", team: "Inter Miami", country: "Argentina" },
    Profile { name: "LeBron James", team: "LA Lakers", country: "USA" },
    Profile { name: "Neymar Jr", team: "Al Hilal", country: "Brazil" },
];

pub fn next_index(index: usize, len: usize) -> usize {
    if len == 0 {
        0
    } else {
        (index + 1) % len
    }
}

pub fn prev_index(index: usize, len: usize) -> usize {
    if len == 0 {
        0
    } else {
        (index % len + len - 1) % len
    }
}

/// Renderable card text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PopupView {
    pub lines: Vec<String>,
    /// Card has prev/next buttons.
    pub pageable: bool,
    /// Page dots: (current, total).
    pub page: Option<(usize, usize)>,
}

/// Card text for the current popup, if any.
pub fn present(popup: Option<&Popup>, roster: &[Profile]) -> Option<PopupView> {
    let popup = popup?;
    match &popup.content {
        PopupContent::Country(name) => Some(PopupView {
            lines: vec![name.clone()],
            pageable: false,
            page: None,
        }),
        PopupContent::Profile { index } => {
            let profile = roster.get(*index)?;
            Some(PopupView {
                lines: vec![
                    profile.name.to_string(),
                    profile.team.to_string(),
                    format!("◍ {}", profile.country.to_uppercase()),
                ],
                pageable: true,
                page: Some((*index, roster.len())),
            })
        }
    }
}

/// A rectangle of terminal cells.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Area {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

impl Area {
    pub fn contains(&self, col: u16, row: u16) -> bool {
        col >= self.x
            && col < self.x.saturating_add(self.width)
            && row >= self.y
            && row < self.y.saturating_add(self.height)
    }
}

/// Where the card and its paging buttons landed on screen.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CardLayout {
    pub card: Area,
    pub prev: Option<Area>,
    pub next: Option<Area>,
}

impl CardLayout {
    /// Card or either button is under the pointer.
    pub fn contains(&self, col: u16, row: u16) -> bool {
        self.card.contains(col, row)
            || self.prev.is_some_and(|a| a.contains(col, row))
            || self.next.is_some_and(|a| a.contains(col, row))
    }
}

/// Center the card horizontally on the anchor cell and sit it just above.
/// Clamped to the screen.
pub fn layout_card(view: &PopupView, anchor: (i32, i32), screen: (u16, u16)) -> CardLayout {
    let text_w = view.lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);
    let extra = usize::from(view.page.is_some());
    let width = (text_w + 4).min(screen.0 as usize) as i32;
    let height = (view.lines.len() + extra + 2).min(screen.1 as usize) as i32;

    // Buttons sit one cell outside the card edges.
    let margin = if view.pageable { 2 } else { 0 };
    let max_x = (screen.0 as i32 - width - margin).max(margin);
    let max_y = (screen.1 as i32 - height).max(0);
    let x = (anchor.0 - width / 2).clamp(margin, max_x);
    let y = (anchor.1 - height).clamp(0, max_y);

    let card = Area {
        x: x as u16,
        y: y as u16,
        width: width as u16,
        height: height as u16,
    };
    let (prev, next) = if view.pageable {
        let mid = card.y + card.height / 2;
        (
            Some(Area { x: card.x.saturating_sub(2), y: mid, width: 2, height: 1 }),
            Some(Area { x: card.x + card.width, y: mid, width: 2, height: 1 }),
        )
    } else {
        (None, None)
    };
    CardLayout { card, prev, next }
}
