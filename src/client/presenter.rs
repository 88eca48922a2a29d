/// Presentation sink.
///
/// The core emits render effects against named regions; what a region looks
/// like is entirely up to the sink. The console implementation below prints
/// one line per update, which is all a terminal client needs.
use crate::duel::machine::Region;

pub trait Presenter {
    /// Render text into a region. Empty text clears the region.
    fn render(&mut self, region: Region, text: &str);

    /// Toggle the search trigger.
    fn set_search_enabled(&mut self, enabled: bool);
}

/// Prints every update as a prefixed line on stdout.
pub struct ConsolePresenter;

impl ConsolePresenter {
    fn region_label(region: Region) -> &'static str {
        match region {
            Region::Status => "status",
            Region::Battle => "battle",
            Region::FloorInfo => "floor",
            Region::Leaderboard => "leaderboard",
            Region::ActiveCount => "active",
        }
    }
}

impl Presenter for ConsolePresenter {
    fn render(&mut self, region: Region, text: &str) {
        if text.is_empty() {
            return;
        }
        println!("[{}] {}", Self::region_label(region), text);
    }

    fn set_search_enabled(&mut self, enabled: bool) {
        if enabled {
            println!("[search] ready (type 'find' to search for an opponent)");
        } else {
            println!("[search] searching...");
        }
    }
}
