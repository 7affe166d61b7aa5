use egui::RichText;

use crate::ScoutApp;
use crate::ftc_api::TeamWithRanking;

const NOTES_HINT: &str = "Enter your scouting notes here...\n\n\
Examples:\n\
• Strong in autonomous\n\
• Consistent scorer\n\
• Good defense strategy\n\
• Works well in alliances with...";

pub fn notes_panel(app: &mut ScoutApp, ctx: &egui::Context) {
    let mut save_clicked = false;

    egui::SidePanel::right("notes_panel")
        .resizable(true)
        .default_width(300.0)
        .show(ctx, |ui| {
            let Some(view) = &mut app.view else {
                return;
            };
            let team_number = view.session.team();

            match app.teams.find(team_number) {
                Some(entry) => team_summary(ui, entry),
                None => {
                    ui.heading(format!("#{}", team_number));
                }
            }
            ui.separator();

            ui.heading("Scouting Notes");
            ui.add(
                egui::TextEdit::multiline(&mut view.notes)
                    .hint_text(NOTES_HINT)
                    .desired_rows(16)
                    .desired_width(f32::INFINITY)
                    .code_editor(),
            );
            ui.horizontal(|ui| {
                ui.label(RichText::new(format!("{} characters", view.notes.chars().count())).small());
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.button("💾 Save Notes").clicked() {
                        save_clicked = true;
                    }
                });
            });

            if let Some(entry) = app.teams.find(team_number) {
                ui.separator();
                match_strategy(ui, entry);
            }
        });

    if save_clicked {
        app.save_notes();
    }
}

fn team_summary(ui: &mut egui::Ui, entry: &TeamWithRanking) {
    let team = &entry.team;
    ui.horizontal(|ui| {
        ui.heading(RichText::new(format!("#{}", team.team_number)).strong());
        if let Some(ranking) = &entry.ranking {
            ui.label(format!("Rank {}", ranking.rank));
        }
    });
    ui.label(RichText::new(team.display_name()).strong());
    if !team.name_short.is_empty() && !team.name_full.is_empty() && team.name_short != team.name_full {
        ui.weak(&team.name_full);
    }
    if let Some(location) = team.location() {
        ui.label(format!("📍 {}", location));
    }
    if let Some(year) = team.rookie_year {
        ui.weak(format!("Rookie Year: {}", year));
    }
    if let Some(ranking) = &entry.ranking {
        ui.label(format!("Record {}", ranking.record()));
        if let Some(opr) = ranking.opr {
            ui.label(format!("OPR {:.2}", opr));
        }
    }
}

fn match_strategy(ui: &mut egui::Ui, entry: &TeamWithRanking) {
    ui.strong("Match Strategy");
    let Some(ranking) = &entry.ranking else {
        ui.weak("No ranking data yet");
        return;
    };
    egui::Grid::new("match_strategy").num_columns(2).show(ui, |ui| {
        ui.label("Qualifying Points:");
        ui.monospace(ranking.qualifying_points.to_string());
        ui.end_row();

        ui.label("Ranking Points:");
        ui.monospace(ranking.ranking_points.to_string());
        ui.end_row();

        if let Some(np) = ranking.np {
            ui.label("Navigation Points:");
            ui.monospace(np.to_string());
            ui.end_row();
        }
        if let Some(tbp) = ranking.tbp {
            ui.label("Tiebreaker Points:");
            ui.monospace(tbp.to_string());
            ui.end_row();
        }
    });
}
