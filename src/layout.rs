use x11rb::protocol::xproto::Window;

pub const MIN_MASTER_RATIO: f32 = 0.1;
pub const MAX_MASTER_RATIO: f32 = 0.9;

/// Where one client goes after a layout pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Placement {
    pub window: Window,
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

/// Clamps a master ratio into the range the layout accepts.
pub fn clamp_ratio(ratio: f32) -> f32 {
    ratio.clamp(MIN_MASTER_RATIO, MAX_MASTER_RATIO)
}

/// Master-stack tiling.
///
/// The first client takes a `master_ratio` share of the usable width on the
/// left; the rest stack vertically on the right. Every edge keeps `gap`
/// pixels of margin. Division rounds down and the last stack client absorbs
/// the remainder, so the stack always fills the usable height exactly.
///
/// `master_ratio` is expected to be clamped already.
pub fn tile(
    windows: &[Window],
    screen_width: u16,
    screen_height: u16,
    gap: u16,
    master_ratio: f32,
) -> Vec<Placement> {
    let gap = i32::from(gap);
    let width = i32::from(screen_width) - 2 * gap;
    let height = i32::from(screen_height) - 2 * gap;

    match windows {
        [] => Vec::new(),
        [only] => vec![Placement {
            window: *only,
            x: gap,
            y: gap,
            width,
            height,
        }],
        [master, stack @ ..] => {
            let master_width = (master_ratio * width as f32).floor() as i32;
            let stack_width = width - master_width - gap;

            let count = stack.len() as i32;
            let free = height - (count - 1) * gap;
            let stack_height = free.div_euclid(count);
            let remainder = free - stack_height * count;

            let mut placements = Vec::with_capacity(windows.len());
            placements.push(Placement {
                window: *master,
                x: gap,
                y: gap,
                width: master_width,
                height,
            });

            for (i, &window) in stack.iter().enumerate() {
                let i = i as i32;
                let extra = if i == count - 1 { remainder } else { 0 };
                placements.push(Placement {
                    window,
                    x: master_width + 2 * gap,
                    y: gap + i * (stack_height + gap),
                    width: stack_width,
                    height: stack_height + extra,
                });
            }
            placements
        }
    }
}
