use egui::{Color32, RichText};

use crate::ScoutApp;
use crate::ftc_api::{TeamStats, TeamWithRanking, filter_teams};
use crate::storage::TeamNumber;

fn rank_color(rank: u32) -> Color32 {
    match rank {
        1 => Color32::GOLD,
        2..=3 => Color32::LIGHT_BLUE,
        4..=8 => Color32::LIGHT_GREEN,
        _ => Color32::GRAY,
    }
}

fn stat(ui: &mut egui::Ui, label: &str, value: String) {
    ui.group(|ui| {
        ui.vertical(|ui| {
            ui.label(RichText::new(label).small());
            ui.label(RichText::new(value).heading().strong());
        });
    });
}

pub fn team_list(app: &mut ScoutApp, ctx: &egui::Context) {
    let mut selected: Option<TeamNumber> = None;
    let mut refresh = false;

    egui::CentralPanel::default().show(ctx, |ui| {
        if !app.credentials.is_complete() {
            ui.colored_label(
                Color32::LIGHT_RED,
                "API credentials not configured. Open Admin settings to add them.",
            );
        }
        if let Some(error) = &app.teams.error {
            ui.colored_label(Color32::LIGHT_RED, error);
        }

        let stats = TeamStats::compute(&app.teams.teams);
        ui.horizontal(|ui| {
            stat(ui, "Total Teams", stats.total.to_string());
            stat(ui, "Ranked Teams", stats.ranked.to_string());
            stat(ui, "Avg OPR", format!("{:.2}", stats.average_opr));
            stat(
                ui,
                "Top Team",
                stats.top_team.map_or_else(|| "N/A".to_owned(), |team| format!("#{}", team)),
            );
        });

        ui.add_space(8.0);
        ui.horizontal(|ui| {
            ui.add(
                egui::TextEdit::singleline(&mut app.teams.search)
                    .hint_text("Search by team number or name...")
                    .desired_width(320.0),
            );
            if ui
                .add_enabled(!app.teams.is_loading(), egui::Button::new("⟳ Refresh Data"))
                .clicked()
            {
                refresh = true;
            }
            if app.teams.is_loading() {
                ui.spinner();
                ui.label("Loading team data...");
            }
        });
        ui.separator();

        let visible = filter_teams(&app.teams.teams, &app.teams.search);
        if visible.is_empty() {
            if !app.teams.is_loading() {
                ui.label("No teams found matching your search.");
            }
            return;
        }

        egui::ScrollArea::vertical().show(ui, |ui| {
            egui::Grid::new("team_table")
                .num_columns(6)
                .spacing([24.0, 6.0])
                .striped(true)
                .show(ui, |ui| {
                    for heading in ["Rank", "Team #", "Team Name", "Location", "W-L-T", "OPR"] {
                        ui.strong(heading);
                    }
                    ui.end_row();

                    for entry in visible {
                        if team_row(ui, entry, app.store().get(entry.team.team_number).is_some()) {
                            selected = Some(entry.team.team_number);
                        }
                        ui.end_row();
                    }
                });
        });
    });

    if refresh {
        app.refresh_teams(ctx);
    }
    if let Some(team) = selected {
        app.open_team(team);
    }
}

/// One table row. Returns true when the team was clicked.
fn team_row(ui: &mut egui::Ui, entry: &TeamWithRanking, has_notes: bool) -> bool {
    match &entry.ranking {
        Some(ranking) => ui.colored_label(rank_color(ranking.rank), format!("#{}", ranking.rank)),
        None => ui.weak("—"),
    };

    let mut clicked = ui
        .link(RichText::new(entry.team.team_number.to_string()).monospace().strong())
        .clicked();

    ui.vertical(|ui| {
        let name = if has_notes {
            format!("{} ✏", entry.team.display_name())
        } else {
            entry.team.display_name().to_owned()
        };
        clicked |= ui.link(name).clicked();
        let team = &entry.team;
        if !team.name_short.is_empty() && team.name_short != team.name_full && !team.name_full.is_empty() {
            ui.label(RichText::new(&team.name_full).small().weak());
        }
    });

    ui.label(entry.team.location().unwrap_or_else(|| "—".to_owned()));

    match &entry.ranking {
        Some(ranking) => ui.monospace(ranking.record()),
        None => ui.weak("—"),
    };

    match entry.ranking.as_ref().and_then(|ranking| ranking.opr) {
        Some(opr) => ui.monospace(format!("{:.1}", opr)),
        None => ui.weak("—"),
    };

    clicked
}
