// src/main.rs
use std::path::PathBuf;
use std::time::{Duration, Instant};

use iced::widget::{button, column, container, pick_list, row, scrollable, text, text_input, Column, Row, Space};
use iced::{executor, theme, window, Alignment, Application, Color, Command, Element, Length, Settings, Subscription, Theme};
use rfd::FileDialog;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod cloud_handler;
mod config;
mod csv_handler;
mod data_types;
mod error;
mod source;
mod table_state;
mod transform;
mod ui;

use config::Settings as DashboardSettings;
use data_types::{DataSource, OrderField, OrderRecord, OrderStatus, SheetSnapshot};
use error::FetchError;
use source::Backend;
use table_state::{PendingWrite, TableView};
use ui::{Palette, Panel, DARK_THEME, LIGHT_THEME};

const VERSION: &str = env!("CARGO_PKG_VERSION");
const NOTICE_TTL: Duration = Duration::from_secs(4);

static STATUS_OPTIONS: &[OrderStatus] = &OrderStatus::ALL;

pub fn main() -> iced::Result {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut settings = Settings::with_flags(config::load_settings());
    settings.window = window::Settings {
        size: (1280, 800),
        resizable: true,
        ..Default::default()
    };
    OrderDashboard::run(settings)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NoticeKind {
    Success,
    Error,
}

struct Notice {
    kind: NoticeKind,
    text: String,
    shown_at: Instant,
}

struct OrderDashboard {
    settings: DashboardSettings,
    backend: Backend,
    table: TableView,
    is_dark_mode: bool,
    notice: Option<Notice>,
}

#[derive(Debug, Clone)]
enum Message {
    TabSelected(String),
    Refresh,
    Loaded(Result<SheetSnapshot, FetchError>),
    ToggleEdit(usize, OrderField),
    DraftChanged(usize, OrderField, String),
    Commit(usize, OrderField),
    StatusPicked(usize, OrderStatus),
    WriteFinished(PendingWrite, bool),
    OpenLocalFolder,
    FolderSelected(Option<PathBuf>),
    UseCloud,
    ToggleTheme,
    Tick,
}

impl Application for OrderDashboard {
    type Executor = executor::Default;
    type Message = Message;
    type Theme = Theme;
    type Flags = DashboardSettings;

    fn new(settings: DashboardSettings) -> (Self, Command<Message>) {
        let backend = Backend::from_settings(&settings);
        let table = TableView::new(&settings.default_tab);
        let app = OrderDashboard {
            settings,
            backend,
            table,
            is_dark_mode: false,
            notice: None,
        };
        let command = app.fetch();
        (app, command)
    }

    fn title(&self) -> String {
        format!("DTF Dashboard v{} - {}", VERSION, self.table.tab())
    }

    fn update(&mut self, message: Message) -> Command<Message> {
        match message {
            Message::TabSelected(tab) => {
                // Re-picking the current tab keeps its edits; Refresh reloads
                if tab == self.table.tab() {
                    return Command::none();
                }
                info!(tab = %tab, "tab selected");
                self.table.select_tab(&tab);
                self.fetch()
            }

            Message::Refresh => {
                self.table.reload();
                self.fetch()
            }

            Message::Loaded(Ok(snapshot)) => {
                // Applied even if it answers an older tab selection
                self.table.load(snapshot);
                Command::none()
            }

            Message::Loaded(Err(err)) => {
                // Fall back to an empty table and zero counters
                warn!(tab = %self.table.tab(), error = %err, "fetch failed");
                self.table.load_failed();
                self.show(NoticeKind::Error, format!("ไม่สามารถดึงข้อมูลได้: {err}"));
                Command::none()
            }

            Message::ToggleEdit(id, field) => {
                self.table.toggle_edit(id, field);
                Command::none()
            }

            Message::DraftChanged(id, field, value) => {
                self.table.update_draft(id, field, value);
                Command::none()
            }

            Message::Commit(id, field) => match self.table.commit(id, field) {
                Some(write) => self.write(write),
                None => Command::none(),
            },

            Message::StatusPicked(id, status) => match self.table.pick_status(id, status) {
                Some(write) => self.write(write),
                None => Command::none(),
            },

            Message::WriteFinished(write, success) => {
                // The record only changes here, after the writer confirmed
                self.table.finish_write(&write, success);
                if success {
                    self.show(NoticeKind::Success, "บันทึกข้อมูลสำเร็จ".to_string());
                } else {
                    self.show(NoticeKind::Error, "ไม่สามารถบันทึกข้อมูลได้".to_string());
                }
                Command::none()
            }

            Message::OpenLocalFolder => Command::perform(
                async { FileDialog::new().pick_folder() },
                Message::FolderSelected,
            ),

            Message::FolderSelected(Some(dir)) => {
                info!(dir = %dir.display(), "switching to local folder");
                self.switch_backend(Backend::local(dir))
            }

            Message::FolderSelected(None) => Command::none(),

            Message::UseCloud => {
                if matches!(self.backend.source, DataSource::Cloud { .. }) {
                    return Command::none();
                }
                let backend = Backend::cloud(&self.settings);
                self.switch_backend(backend)
            }

            Message::ToggleTheme => {
                self.is_dark_mode = !self.is_dark_mode;
                Command::none()
            }

            Message::Tick => {
                if self.notice.as_ref().map_or(false, |n| n.shown_at.elapsed() >= NOTICE_TTL) {
                    self.notice = None;
                }
                Command::none()
            }
        }
    }

    fn subscription(&self) -> Subscription<Message> {
        if self.notice.is_some() {
            iced::time::every(Duration::from_millis(500)).map(|_| Message::Tick)
        } else {
            Subscription::none()
        }
    }

    fn theme(&self) -> Theme {
        if self.is_dark_mode {
            Theme::Dark
        } else {
            Theme::Light
        }
    }

    fn view(&self) -> Element<Message> {
        let palette = self.palette();

        let heading = column![
            text("DTF Dashboard").size(30).style(palette.fg),
            text(self.backend.source.describe()).size(14).style(palette.muted),
        ]
        .spacing(4)
        .align_items(Alignment::Center)
        .width(Length::Fill);

        let mut content = column![heading, self.summary_cards(palette), self.tab_bar()].spacing(16);
        if let Some(notice) = &self.notice {
            content = content.push(self.notice_banner(notice, palette));
        }
        content = content.push(
            container(self.orders_table(palette))
                .padding(12)
                .width(Length::Fill)
                .height(Length::Fill)
                .style(theme::Container::Custom(Box::new(Panel::card(palette)))),
        );

        container(column![content.padding(20).height(Length::Fill), self.footer(palette)])
            .width(Length::Fill)
            .height(Length::Fill)
            .style(theme::Container::Custom(Box::new(Panel::fill(palette.bg))))
            .into()
    }
}

impl OrderDashboard {
    fn palette(&self) -> &'static Palette {
        if self.is_dark_mode {
            &DARK_THEME
        } else {
            &LIGHT_THEME
        }
    }

    fn fetch(&self) -> Command<Message> {
        let reader = self.backend.reader.clone();
        let tab = self.table.tab().to_string();
        Command::perform(source::load_snapshot(reader, tab), Message::Loaded)
    }

    fn write(&self, write: PendingWrite) -> Command<Message> {
        let writer = self.backend.writer.clone();
        let future = source::write_back(writer, write.tab.clone(), write.coord, write.value.clone());
        Command::perform(future, move |success| Message::WriteFinished(write, success))
    }

    fn switch_backend(&mut self, backend: Backend) -> Command<Message> {
        // Same tab, new source: drop edits and load it again
        self.backend = backend;
        let tab = self.table.tab().to_string();
        self.table.select_tab(&tab);
        self.fetch()
    }

    fn show(&mut self, kind: NoticeKind, text: String) {
        self.notice = Some(Notice {
            kind,
            text,
            shown_at: Instant::now(),
        });
    }

    fn summary_cards(&self, palette: &Palette) -> Element<'_, Message> {
        let summary = self.table.summary();
        let cards = [
            ("จำนวนออเดอร์", summary.total_orders, palette.total),
            ("รอออกแบบ", summary.pending_design, palette.pending),
            ("จัดส่ง", summary.shipped, palette.shipped),
        ];

        Row::with_children(
            cards
                .into_iter()
                .map(|(label, value, color)| {
                    let value = if self.table.is_loading() {
                        "…".to_string()
                    } else {
                        value.to_string()
                    };
                    container(
                        column![
                            text(label).size(14).style(palette.muted),
                            text(value).size(28).style(color),
                        ]
                        .spacing(8),
                    )
                    .padding(16)
                    .width(Length::Fill)
                    .style(theme::Container::Custom(Box::new(Panel::card(palette))))
                    .into()
                })
                .collect(),
        )
        .spacing(16)
        .into()
    }

    fn tab_bar(&self) -> Element<'_, Message> {
        let tabs = self.settings.tabs.iter().map(|tab| {
            let style = if tab == self.table.tab() {
                theme::Button::Primary
            } else {
                theme::Button::Secondary
            };
            button(text(tab).size(14))
                .padding([6, 10])
                .style(style)
                .on_press(Message::TabSelected(tab.clone()))
                .into()
        });
        Row::with_children(tabs.collect()).spacing(4).into()
    }

    fn notice_banner(&self, notice: &Notice, palette: &Palette) -> Element<'_, Message> {
        let color = match notice.kind {
            NoticeKind::Success => palette.success,
            NoticeKind::Error => palette.error,
        };
        container(text(&notice.text).size(15).style(Color::WHITE))
            .padding(10)
            .width(Length::Fill)
            .style(theme::Container::Custom(Box::new(Panel {
                bg: color,
                border: Color::TRANSPARENT,
                radius: 6.0,
            })))
            .into()
    }

    fn orders_table(&self, palette: &Palette) -> Element<'_, Message> {
        if self.table.is_loading() {
            return centered(text("กำลังโหลด…").size(18).style(palette.muted));
        }
        if self.table.records().is_empty() {
            return centered(text("ไม่มีข้อมูลในชีตนี้").size(18).style(palette.muted));
        }

        let headers = Row::with_children(
            OrderField::all()
                .map(|field| {
                    container(text(field.header()).size(14).style(palette.fg))
                        .padding(6)
                        .width(column_width(field))
                        .into()
                })
                .collect(),
        );
        let header = container(headers)
            .width(Length::Fill)
            .style(theme::Container::Custom(Box::new(Panel::fill(palette.header_bg))));

        let rows = self.table.records().iter().map(|record| {
            Row::with_children(
                OrderField::all()
                    .map(|field| {
                        container(self.cell(record, field, palette))
                            .padding(4)
                            .width(column_width(field))
                            .into()
                    })
                    .collect(),
            )
            .align_items(Alignment::Center)
            .into()
        });

        column![header, scrollable(Column::with_children(rows.collect()).spacing(2)).height(Length::Fill)]
            .spacing(4)
            .into()
    }

    fn cell(&self, record: &OrderRecord, field: OrderField, palette: &Palette) -> Element<'_, Message> {
        let id = record.id;

        if field == OrderField::Status {
            return pick_list(
                STATUS_OPTIONS,
                OrderStatus::from_label(&record.status),
                move |status| Message::StatusPicked(id, status),
            )
            .placeholder("เลือกสถานะ")
            .text_size(14)
            .width(Length::Fill)
            .into();
        }

        if let Some(draft) = self.table.draft(id, field) {
            let saving = self.table.is_saving(id, field);
            let mut input = text_input(field.header(), draft).size(14).padding(4);
            let mut save = button(text(if saving { "…" } else { "บันทึก" }).size(13)).padding([4, 8]);
            let mut cancel = button(text("✕").size(13)).padding([4, 6]).style(theme::Button::Text);
            if !saving {
                input = input
                    .on_input(move |value| Message::DraftChanged(id, field, value))
                    .on_submit(Message::Commit(id, field));
                save = save.on_press(Message::Commit(id, field));
                cancel = cancel.on_press(Message::ToggleEdit(id, field));
            }
            return row![input, save, cancel].spacing(4).align_items(Alignment::Center).into();
        }

        row![
            text(record.field_text(field)).size(14).style(palette.fg).width(Length::Fill),
            button(text("✎").size(13))
                .padding([2, 6])
                .style(theme::Button::Text)
                .on_press(Message::ToggleEdit(id, field)),
        ]
        .spacing(2)
        .align_items(Alignment::Center)
        .into()
    }

    fn footer(&self, palette: &Palette) -> Element<'_, Message> {
        let updated = match self.table.fetched_at() {
            Some(at) => format!("Updated {}", at.format("%H:%M:%S")),
            None => String::new(),
        };

        row![
            text(format!("DTF Dashboard v{VERSION}")).size(13).style(palette.muted),
            text(updated).size(13).style(palette.muted),
            Space::with_width(Length::Fill),
            button(text("Refresh").size(14)).on_press(Message::Refresh),
            button(text("Google Sheets").size(14)).on_press(Message::UseCloud),
            button(text("Open folder").size(14)).on_press(Message::OpenLocalFolder),
            button(text(if self.is_dark_mode { "Light" } else { "Dark" }).size(14))
                .style(theme::Button::Secondary)
                .on_press(Message::ToggleTheme),
        ]
        .spacing(10)
        .padding(10)
        .align_items(Alignment::Center)
        .into()
    }
}

fn column_width(field: OrderField) -> Length {
    match field {
        OrderField::ChildDetails => Length::FillPortion(3),
        OrderField::Status | OrderField::Notes | OrderField::TrackingNumber => Length::FillPortion(2),
        OrderField::Quantity => Length::FillPortion(1),
        _ => Length::FillPortion(2),
    }
}

fn centered<'a>(content: impl Into<Element<'a, Message>>) -> Element<'a, Message> {
    container(content)
        .width(Length::Fill)
        .height(Length::Fill)
        .center_x()
        .center_y()
        .into()
}
