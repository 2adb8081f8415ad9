use crate::globe::popup::Area;
use crate::terminal::Terminal;
use crossterm::style::Color;

/// Keys for the globe screen.
pub const GLOBE_HELP: &str = "\
GLOBE
─────────────────
←/→ h/l  Orbit
↑/↓ k/j  Tilt
a        Autorotate
[ / ]    Page card
r        Reload arcs
?        Toggle help
q/Esc    Quit";

/// Box-drawn panel with one text line per row, padded one cell on each side.
/// Lines that do not fit are cut at the right border.
pub fn draw_box(term: &mut Terminal, area: Area, lines: &[String], border: Color, text: Color) {
    if area.width < 2 || area.height < 2 {
        return;
    }
    let x0 = area.x as i32;
    let y0 = area.y as i32;
    let x1 = x0 + area.width as i32 - 1;
    let y1 = y0 + area.height as i32 - 1;

    // Top and bottom borders
    term.set(x0, y0, '┌', Some(border), false);
    term.set(x1, y0, '┐', Some(border), false);
    term.set(x0, y1, '└', Some(border), false);
    term.set(x1, y1, '┘', Some(border), false);
    for x in x0 + 1..x1 {
        term.set(x, y0, '─', Some(border), false);
        term.set(x, y1, '─', Some(border), false);
    }

    let inner = (area.width as usize).saturating_sub(2);
    for y in y0 + 1..y1 {
        term.set(x0, y, '│', Some(border), false);
        term.set(x1, y, '│', Some(border), false);

        let line = lines.get((y - y0 - 1) as usize).map(String::as_str).unwrap_or("");
        let padded: String = format!(" {}", line)
            .chars()
            .chain(std::iter::repeat(' '))
            .take(inner)
            .collect();
        term.set_str(x0 + 1, y, &padded, Some(text), false);
    }
}

/// Render a centered help overlay box with the provided text.
pub fn render_help_overlay(term: &mut Terminal, help_text: &str) {
    if help_text.is_empty() {
        return;
    }
    let (width, height) = term.size();
    let lines: Vec<String> = help_text.lines().map(str::to_string).collect();
    let max_width = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);
    let box_width = (max_width + 4).min(width as usize) as u16;
    let box_height = (lines.len() + 2).min(height as usize) as u16;

    let area = Area {
        x: width.saturating_sub(box_width) / 2,
        y: height.saturating_sub(box_height) / 2,
        width: box_width,
        height: box_height,
    };
    draw_box(term, area, &lines, Color::White, Color::Grey);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(term: &Terminal, y: i32) -> String {
        let (w, _) = term.size();
        (0..w as i32).filter_map(|x| term.get(x, y).map(|c| c.ch)).collect()
    }

    #[test]
    fn box_has_corners_and_padded_text() {
        let mut term = Terminal::offscreen(12, 4);
        let area = Area { x: 1, y: 0, width: 8, height: 3 };
        draw_box(&mut term, area, &["hi".to_string()], Color::White, Color::Grey);
        assert_eq!(row(&term, 0), " ┌──────┐   ");
        assert_eq!(row(&term, 1), " │ hi   │   ");
        assert_eq!(row(&term, 2), " └──────┘   ");
    }

    #[test]
    fn long_lines_are_clipped_inside_the_border() {
        let mut term = Terminal::offscreen(6, 3);
        let area = Area { x: 0, y: 0, width: 6, height: 3 };
        draw_box(&mut term, area, &["abcdefgh".to_string()], Color::White, Color::Grey);
        assert_eq!(row(&term, 1), "│ abc│");
    }

    #[test]
    fn overlay_is_centered() {
        let mut term = Terminal::offscreen(20, 7);
        render_help_overlay(&mut term, "ab\ncd");
        // 6 wide, 4 tall: x = 7, y = 1
        assert_eq!(term.get(7, 1).map(|c| c.ch), Some('┌'));
        assert_eq!(term.get(12, 4).map(|c| c.ch), Some('┘'));
        assert_eq!(term.get(9, 2).map(|c| c.ch), Some('a'));
    }
}
