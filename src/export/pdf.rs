//! PDF export: a formatted report of the filtered expense list.
//!
//! The report combines the expense table, the filtered total, a vector pie
//! chart of the category breakdown, the generation timestamp and the
//! username. Layout is fixed A4 with builtin fonts; the pie geometry comes
//! from [crate::export::pie].

use axum::{
    Extension,
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
};
use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Mm, PdfDocument, PdfLayerReference, Point, Polygon, Rgb,
    path::{PaintMode, WindingOrder},
};
use time::{
    OffsetDateTime, UtcOffset, format_description::BorrowedFormatItem, macros::format_description,
};

use crate::{
    Error,
    dashboard::aggregation::{category_breakdown, total},
    expense::{Expense, ExpenseOrder, FilterQuery, list_expenses},
    export::{
        ExportState,
        pie::{PieSlice, pie_slices},
    },
    html::format_currency,
    timezone::get_local_offset,
    user::{UserID, get_user_by_id},
};

const PAGE_WIDTH: f64 = 210.0;
const PAGE_HEIGHT: f64 = 297.0;
const MARGIN: f64 = 20.0;
const ROW_HEIGHT: f64 = 6.5;

const TIMESTAMP_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]");

/// Everything the PDF renderer needs, already fetched and aggregated.
pub struct ExpenseReport<'a> {
    /// The name of the user the report belongs to.
    pub username: &'a str,
    /// When the report was generated, formatted for display.
    pub generated_at: String,
    /// The filtered expenses, newest first.
    pub expenses: &'a [Expense],
    /// The sum of the filtered amounts.
    pub total: f64,
    /// The category breakdown as pie slices, absent when there is nothing to
    /// chart.
    pub slices: Option<Vec<PieSlice>>,
}

fn pdf_error(error: impl ToString) -> Error {
    Error::PdfRenderError(error.to_string())
}

/// Render `report` as PDF bytes.
pub fn render_report(report: &ExpenseReport) -> Result<Vec<u8>, Error> {
    let (doc, first_page, first_layer) =
        PdfDocument::new("Expense Report", Mm(PAGE_WIDTH as f32), Mm(PAGE_HEIGHT as f32), "Layer 1");

    let font = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(pdf_error)?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(pdf_error)?;

    let layer = doc.get_page(first_page).get_layer(first_layer);

    layer.use_text("Expense Report", 20.0, Mm(MARGIN as f32), Mm(272.0), &bold);
    layer.use_text(
        format!("Prepared for {}", report.username),
        11.0,
        Mm(MARGIN as f32),
        Mm(263.0),
        &font,
    );
    layer.use_text(
        format!("Generated at {}", report.generated_at),
        10.0,
        Mm(MARGIN as f32),
        Mm(257.0),
        &font,
    );
    layer.use_text(
        format!(
            "Total: {} across {} expenses",
            format_currency(report.total),
            report.expenses.len()
        ),
        11.0,
        Mm(MARGIN as f32),
        Mm(248.0),
        &bold,
    );

    let table_top = match &report.slices {
        Some(slices) => {
            draw_pie_chart(&layer, &font, slices);
            150.0
        }
        None => 238.0,
    };

    draw_expense_table(&doc, &layer, &font, &bold, report.expenses, table_top);

    doc.save_to_bytes().map_err(pdf_error)
}

/// The fill colours used for pie slices, cycled by slice index.
fn slice_color(index: usize) -> Color {
    const PALETTE: [(f64, f64, f64); 6] = [
        (0.36, 0.56, 0.89),
        (0.91, 0.45, 0.38),
        (0.48, 0.76, 0.46),
        (0.93, 0.74, 0.33),
        (0.62, 0.47, 0.80),
        (0.55, 0.55, 0.55),
    ];

    let (r, g, b) = PALETTE[index % PALETTE.len()];

    Color::Rgb(Rgb::new(r as f32, g as f32, b as f32, None))
}

fn draw_pie_chart(layer: &PdfLayerReference, font: &IndirectFontRef, slices: &[PieSlice]) {
    const CENTER_X: f64 = 60.0;
    const CENTER_Y: f64 = 198.0;
    const RADIUS: f64 = 36.0;

    for (index, slice) in slices.iter().enumerate() {
        layer.set_fill_color(slice_color(index));
        layer.add_polygon(Polygon {
            rings: vec![slice_polygon(CENTER_X, CENTER_Y, RADIUS, slice)],
            mode: PaintMode::Fill,
            winding_order: WindingOrder::NonZero,
        });
    }

    // Legend with percentage labels to the right of the pie.
    let legend_x = 110.0;
    let mut legend_y = CENTER_Y + 24.0;

    for (index, slice) in slices.iter().enumerate() {
        layer.set_fill_color(slice_color(index));
        layer.add_polygon(Polygon {
            rings: vec![vec![
                (Point::new(Mm(legend_x as f32), Mm(legend_y as f32)), false),
                (Point::new(Mm((legend_x + 3.5) as f32), Mm(legend_y as f32)), false),
                (Point::new(Mm((legend_x + 3.5) as f32), Mm((legend_y + 3.5) as f32)), false),
                (Point::new(Mm(legend_x as f32), Mm((legend_y + 3.5) as f32)), false),
            ]],
            mode: PaintMode::Fill,
            winding_order: WindingOrder::NonZero,
        });

        layer.set_fill_color(Color::Rgb(Rgb::new(0.0, 0.0, 0.0, None)));
        layer.use_text(
            format!(
                "{}: {} ({:.1}%)",
                slice.category,
                format_currency(slice.value),
                slice.percent
            ),
            10.0,
            Mm((legend_x + 6.0) as f32),
            Mm(legend_y as f32),
            font,
        );

        legend_y -= 8.0;
    }

    layer.set_fill_color(Color::Rgb(Rgb::new(0.0, 0.0, 0.0, None)));
}

/// Approximate a pie slice with straight segments from the centre around the
/// arc and back.
fn slice_polygon(center_x: f64, center_y: f64, radius: f64, slice: &PieSlice) -> Vec<(Point, bool)> {
    let steps = ((slice.sweep / std::f64::consts::TAU) * 64.0).ceil().max(2.0) as usize;

    let mut points = vec![(Point::new(Mm(center_x as f32), Mm(center_y as f32)), false)];

    for step in 0..=steps {
        let angle = slice.start_angle + slice.sweep * (step as f64 / steps as f64);
        points.push((
            Point::new(
                Mm((center_x + radius * angle.cos()) as f32),
                Mm((center_y + radius * angle.sin()) as f32),
            ),
            false,
        ));
    }

    points
}

fn draw_table_header(layer: &PdfLayerReference, bold: &IndirectFontRef, y: f64) {
    layer.use_text("Date", 10.0, Mm(MARGIN as f32), Mm(y as f32), bold);
    layer.use_text("Description", 10.0, Mm(50.0), Mm(y as f32), bold);
    layer.use_text("Category", 10.0, Mm(130.0), Mm(y as f32), bold);
    layer.use_text("Amount", 10.0, Mm(163.0), Mm(y as f32), bold);
}

fn draw_expense_table(
    doc: &printpdf::PdfDocumentReference,
    first_layer: &PdfLayerReference,
    font: &IndirectFontRef,
    bold: &IndirectFontRef,
    expenses: &[Expense],
    table_top: f64,
) {
    let mut layer = first_layer.clone();
    let mut y = table_top;

    draw_table_header(&layer, bold, y);
    y -= ROW_HEIGHT;

    for expense in expenses {
        if y < MARGIN {
            let (page, page_layer) = doc.add_page(Mm(PAGE_WIDTH as f32), Mm(PAGE_HEIGHT as f32), "Layer 1");
            layer = doc.get_page(page).get_layer(page_layer);
            y = PAGE_HEIGHT - MARGIN;

            draw_table_header(&layer, bold, y);
            y -= ROW_HEIGHT;
        }

        // Long descriptions would run into the category column.
        let description: String = expense.description.chars().take(45).collect();

        layer.use_text(expense.date.to_string(), 9.0, Mm(MARGIN as f32), Mm(y as f32), font);
        layer.use_text(description, 9.0, Mm(50.0), Mm(y as f32), font);
        layer.use_text(expense.category.to_string(), 9.0, Mm(130.0), Mm(y as f32), font);
        layer.use_text(
            format!("{:.2}", expense.amount),
            9.0,
            Mm(163.0),
            Mm(y as f32),
            font,
        );

        y -= ROW_HEIGHT;
    }
}

/// A route handler that returns the filtered expenses as an
/// `application/pdf` attachment, newest first.
///
/// Accepts the same `start`, `end` and `category` query parameters as the
/// dashboard.
pub async fn export_pdf_endpoint(
    State(state): State<ExportState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<FilterQuery>,
) -> Response {
    let filter = query.to_filter();

    let (user, expenses) = {
        let connection = match state.db_connection.lock() {
            Ok(connection) => connection,
            Err(error) => {
                tracing::error!("could not acquire database lock: {error}");
                return Error::DatabaseLockError.into_response();
            }
        };

        let user = match get_user_by_id(user_id, &connection) {
            Ok(user) => user,
            Err(error) => {
                tracing::error!("could not load user for PDF export: {error}");
                return error.into_response();
            }
        };

        let expenses =
            match list_expenses(user_id, &filter, ExpenseOrder::DateDescending, &connection) {
                Ok(expenses) => expenses,
                Err(error) => {
                    tracing::error!("could not load expenses for PDF export: {error}");
                    return error.into_response();
                }
            };

        (user, expenses)
    };

    let local_offset = get_local_offset(&state.local_timezone).unwrap_or(UtcOffset::UTC);
    let generated_at = OffsetDateTime::now_utc()
        .to_offset(local_offset)
        .format(TIMESTAMP_FORMAT)
        .unwrap_or_default();

    let report = ExpenseReport {
        username: &user.username,
        generated_at,
        total: total(&expenses),
        slices: pie_slices(&category_breakdown(&expenses)),
        expenses: &expenses,
    };

    let pdf_bytes = match render_report(&report) {
        Ok(pdf_bytes) => pdf_bytes,
        Err(error) => {
            tracing::error!("could not render PDF export: {error}");
            return error.into_response();
        }
    };

    (
        [
            (header::CONTENT_TYPE, "application/pdf"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"expense_report.pdf\"",
            ),
        ],
        pdf_bytes,
    )
        .into_response()
}
