use crate::version::MIN_SERVER_VERSION;
use crossterm::style::{Color, Stylize};
use rand::seq::IndexedRandom;
use std::io::{self, Write};

/// 启动横幅
pub const BANNER: &str = r"    __       _         _
   / /  ___ | | ____ _| |  ___  ___
  / /  / _ \| |/ / _  | | / __|/ _ \
 / /__| (_) |   < (_| | |_\__ \ (_) |
 \____/\___/|_|\_\__,_|_(_)___/\___/ ";

/// 横幅可选颜色
const BANNER_COLORS: [Color; 5] = [
    Color::Magenta,
    Color::Blue,
    Color::Cyan,
    Color::Green,
    Color::Red,
];

/// 输出启动横幅及隧道地址
///
/// `public` 和 `lan` 为空时对应行不输出。
pub fn write_startup_banner<W: Write>(out: &mut W, public: &str, lan: &str) -> io::Result<()> {
    let color = BANNER_COLORS
        .choose(&mut rand::rng())
        .copied()
        .unwrap_or(Color::Magenta);

    writeln!(out, "{}\n", BANNER.with(color))?;
    writeln!(
        out,
        "{}\t{}",
        "Minimum Lokal Client".red(),
        MIN_SERVER_VERSION
    )?;

    if !public.is_empty() {
        writeln!(out, "{}\t\thttps://{}", "Public Address".cyan(), public)?;
    }

    if !lan.is_empty() {
        writeln!(out, "{}\t\thttps://{}", "LAN Address".green(), lan)?;
    }

    writeln!(out)?;
    out.flush()
}
