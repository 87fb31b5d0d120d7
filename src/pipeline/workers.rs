//! The concrete per-stage worker bodies.
//!
//! Grounded on `original_source/processor.go` (`analyze_pdf_path`,
//! `scan_path_with_clam_av`), `original_source/pipeline.go`
//! (`extractPagesFromPdf`, `convertPageToPng`, `generateLightThumbnails`,
//! `generateDarkThumbnails`, `performOcrOnPdf`, `convertPngToJpg`), and
//! `original_source/analyzer.go` (`analyze_StartOnFullText`,
//! `analyzeCryptonyms`). Each worker mirrors its Go counterpart's shape: do
//! the stage's work, persist the mutated record/manifest, forward to the
//! next channel regardless of a per-item failure (matching the Go `defer`
//! pattern), and only drop the item outright where the original does too.

use std::path::{Path, PathBuf};

use image::DynamicImage;
use tokio::sync::mpsc;
use tracing::{error, warn};

use crate::cryptonyms;
use crate::dates;
use crate::images;
use crate::model::{self, Document, PendingPage, ResultData};
use crate::pipeline::stages::run_stage;
use crate::pipeline::{Channels, PipelineContext};
use crate::record;
use crate::tools;

async fn forward<T: Send + 'static>(tx: &mpsc::Sender<T>, item: T) {
    let _ = tx.send(item).await;
}

/// Validate (and, if rejected, repair) the imported PDF, then record its
/// page count and info block.
async fn worker_validate(ctx: PipelineContext, tx_next: mpsc::Sender<ResultData>, mut item: ResultData) {
    if !ctx.settings.no_clam {
        match tools::scan_and_remove(&ctx.binaries, &ctx.gates.shafile, &item.pdf_path).await {
            Ok(true) => {
                warn!(identifier = %item.identifier, path = %item.pdf_path.display(), "clamav took action against imported PDF, abandoning");
                return;
            }
            Ok(false) => {}
            Err(err) => {
                error!(identifier = %item.identifier, %err, "clamscan failed");
                return;
            }
        }
    }

    let info = match tools::pdf_info(&ctx.binaries, &ctx.gates.pdfcpu, &item.pdf_path).await {
        Ok(info) => info,
        Err(first_err) => {
            warn!(identifier = %item.identifier, %first_err, "pdfcpu info failed, attempting repair");
            let repaired_path = item.pdf_path.with_extension("repaired.pdf");
            if let Err(err) = tools::repair_pdf(&ctx.binaries, &ctx.gates.gs, &item.pdf_path, &repaired_path).await {
                error!(identifier = %item.identifier, %err, "gs repair failed");
                return;
            }
            if let Err(err) = tokio::fs::rename(&repaired_path, &item.pdf_path).await {
                error!(identifier = %item.identifier, %err, "failed to replace PDF with repaired copy");
                return;
            }
            match tools::pdf_info(&ctx.binaries, &ctx.gates.pdfcpu, &item.pdf_path).await {
                Ok(info) => info,
                Err(err) => {
                    error!(identifier = %item.identifier, %err, "pdfcpu info failed again after repair, abandoning");
                    return;
                }
            }
        }
    };

    let (page_count, _has_fonts) = match tools::validate_pdf(&ctx.binaries, &ctx.gates.pdfcpu, &item.pdf_path).await {
        Ok(v) => v,
        Err(err) => {
            error!(identifier = %item.identifier, %err, "pdfcpu validate failed");
            return;
        }
    };

    if let Err(err) = tools::optimize_pdf(&ctx.binaries, &ctx.gates.pdfcpu, &item.pdf_path).await {
        error!(identifier = %item.identifier, %err, "pdfcpu optimize failed, abandoning");
        return;
    }

    item.info = info;
    item.total_pages = page_count;

    if let Err(err) = record::write_result_data(&ctx.gates.wjsonfile, &item).await {
        error!(identifier = %item.identifier, %err, "failed to persist record.json");
        return;
    }

    ctx.registries.insert_result_data(item.clone()).await;

    forward(&tx_next, item).await;
}

/// Extract the embedded text layer, if any, ahead of per-page rendering.
async fn worker_extract_text(ctx: PipelineContext, tx_next: mpsc::Sender<ResultData>, item: ResultData) {
    if let Err(err) = tools::extract_text(&ctx.binaries, &ctx.gates.pdftotext, &item.pdf_path, &item.extracted_text_path).await {
        warn!(identifier = %item.identifier, %err, "pdftotext failed, continuing without extracted text");
    }
    forward(&tx_next, item).await;
}

fn page_number_from_extracted_name(name: &str) -> Option<u32> {
    let (_, suffix) = name.split_once("_page_")?;
    suffix.strip_suffix(".pdf")?.parse().ok()
}

/// Split the PDF into one single-page PDF per page, minting a [`PendingPage`]
/// for each and fanning them out into the PNG-rendering channel.
async fn worker_extract_pages(ctx: PipelineContext, tx_next: mpsc::Sender<PendingPage>, item: ResultData) {
    let pages_dir = item.pages_dir();
    if let Err(err) = tokio::fs::create_dir_all(&pages_dir).await {
        error!(identifier = %item.identifier, %err, "failed to create pages directory");
        return;
    }

    if let Err(err) = tools::extract_pages(&ctx.binaries, &ctx.gates.pdfcpu, &item.pdf_path, &pages_dir).await {
        error!(identifier = %item.identifier, %err, "pdfcpu extract failed");
        return;
    }

    let mut entries = match tokio::fs::read_dir(&pages_dir).await {
        Ok(e) => e,
        Err(err) => {
            error!(identifier = %item.identifier, %err, "failed to walk pages directory");
            return;
        }
    };

    loop {
        let entry = match entries.next_entry().await {
            Ok(Some(e)) => e,
            Ok(None) => break,
            Err(err) => {
                error!(identifier = %item.identifier, %err, "error reading pages directory entry");
                break;
            }
        };

        let path = entry.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !name.ends_with(".pdf") {
            continue;
        }
        let Some(page_number) = page_number_from_extracted_name(name) else {
            warn!(name, "skipping unexpectedly named extracted page PDF");
            continue;
        };

        let identifier = ctx.mint.mint(9).await;
        let padded = model::pad_page_number(page_number);
        let page = PendingPage {
            identifier,
            record_identifier: item.identifier.clone(),
            page_number,
            pdf_path: path,
            pages_dir: pages_dir.clone(),
            ocr_text_path: pages_dir.join(format!("ocr.{padded}.txt")),
            manifest_path: pages_dir.join(format!("page.{padded}.json")),
            images: model::build_image_paths(&pages_dir, page_number),
            language: String::new(),
            cryptonyms: Vec::new(),
            dates: Vec::new(),
        };

        if let Err(err) = record::write_pending_page(&ctx.gates.wjsonfile, &page).await {
            error!(page_identifier = %page.identifier, %err, "failed to persist page manifest");
            continue;
        }

        forward(&tx_next, page).await;
    }
}

/// Render the page's single-page PDF into the light-original PNG.
async fn worker_generate_png(ctx: PipelineContext, tx_next: mpsc::Sender<PendingPage>, item: PendingPage) {
    let target = &item.images.png_light.original;

    let needs_render = match tokio::fs::read(target).await {
        Ok(bytes) => images::validate_png(target, &bytes).is_err(),
        Err(_) => true,
    };

    if needs_render {
        let _ = tokio::fs::remove_file(target).await;
        if let Err(err) = tools::render_pages_to_png(&ctx.binaries, &ctx.gates.pdftoppm, &item.pdf_path, target).await {
            error!(page_identifier = %item.identifier, %err, "pdftoppm render failed");
            return;
        }
    }

    forward(&tx_next, item).await;
}

async fn resize_into(gate: &tokio::sync::Semaphore, source: &DynamicImage, width: u32, dest: &Path) -> Result<(), crate::error::ImageError> {
    if tokio::fs::metadata(dest).await.is_ok() {
        return Ok(());
    }
    let _permit = gate.acquire().await.expect("gate semaphore never closed");
    let rgba = images::normalize_to_rgba8(source.clone());
    let resized = images::resize_bilinear(&rgba, width);
    DynamicImage::ImageRgba8(resized).save(dest)?;
    Ok(())
}

/// Derive the large/medium/small light thumbnails from the light original.
async fn worker_generate_light(ctx: PipelineContext, tx_next: mpsc::Sender<PendingPage>, item: PendingPage) {
    let original_path = item.images.png_light.original.clone();
    let original_bytes = match tokio::fs::read(&original_path).await {
        Ok(b) => b,
        Err(err) => {
            error!(page_identifier = %item.identifier, %err, "failed to open light original PNG");
            forward(&tx_next, item).await;
            return;
        }
    };

    let decoded = match image::load_from_memory(&original_bytes) {
        Ok(img) => img,
        Err(err) => {
            error!(page_identifier = %item.identifier, %err, "failed to decode light original PNG");
            forward(&tx_next, item).await;
            return;
        }
    };

    for (width, dest) in [
        (999, &item.images.png_light.large),
        (666, &item.images.png_light.medium),
        (333, &item.images.png_light.small),
    ] {
        if let Err(err) = resize_into(&ctx.gates.resize, &decoded, width, dest).await {
            error!(page_identifier = %item.identifier, %err, dest = %dest.display(), "failed to resize light thumbnail");
        }
    }

    forward(&tx_next, item).await;
}

/// Two-pass recolor the light original into a dark original, then derive
/// its large/medium/small thumbnails the same way.
async fn worker_generate_dark(ctx: PipelineContext, tx_next: mpsc::Sender<PendingPage>, item: PendingPage) {
    if tokio::fs::metadata(&item.images.png_dark.original).await.is_err() {
        if let Err(err) = tools::recolor_dark_pass_one(
            &ctx.binaries,
            &ctx.gates.convert,
            &item.images.png_light.original,
            &item.images.png_dark.original,
        )
        .await
        {
            error!(page_identifier = %item.identifier, %err, "dark recolor pass one failed");
            forward(&tx_next, item).await;
            return;
        }
        if let Err(err) = tools::recolor_dark_pass_two(&ctx.binaries, &ctx.gates.convert, &item.images.png_dark.original).await {
            error!(page_identifier = %item.identifier, %err, "dark recolor pass two failed");
            forward(&tx_next, item).await;
            return;
        }
    }

    let dark_bytes = match tokio::fs::read(&item.images.png_dark.original).await {
        Ok(b) => b,
        Err(err) => {
            error!(page_identifier = %item.identifier, %err, "failed to open dark original PNG");
            forward(&tx_next, item).await;
            return;
        }
    };
    let decoded = match image::load_from_memory(&dark_bytes) {
        Ok(img) => img,
        Err(err) => {
            error!(page_identifier = %item.identifier, %err, "failed to decode dark original PNG");
            forward(&tx_next, item).await;
            return;
        }
    };

    for (width, dest) in [
        (999, &item.images.png_dark.large),
        (666, &item.images.png_dark.medium),
        (333, &item.images.png_dark.small),
    ] {
        if let Err(err) = resize_into(&ctx.gates.resize, &decoded, width, dest).await {
            error!(page_identifier = %item.identifier, %err, dest = %dest.display(), "failed to resize dark thumbnail");
        }
    }

    forward(&tx_next, item).await;
}

/// OCR the light original, skipping work already done (per `file_has_data`).
async fn worker_perform_ocr(ctx: PipelineContext, tx_next: mpsc::Sender<PendingPage>, item: PendingPage) {
    let already_done = record::file_has_data(&ctx.gates.filedata, &item.ocr_text_path).await.unwrap_or(false);
    if !already_done {
        let dest_without_extension = item.ocr_text_path.with_extension("");
        if let Err(err) = tools::ocr_page(&ctx.binaries, &ctx.gates.tesseract, &item.images.png_light.original, &dest_without_extension).await {
            error!(page_identifier = %item.identifier, %err, "tesseract OCR failed");
        }
    }
    forward(&tx_next, item).await;
}

async fn convert_one_to_jpg(gate: &tokio::sync::Semaphore, quality: u8, progressive: bool, png: &Path, jpg: &Path) -> Result<(), crate::error::ImageError> {
    let _permit = gate.acquire().await.expect("gate semaphore never closed");
    let bytes = tokio::fs::read(png).await?;
    let decoded = image::load_from_memory(&bytes)?;
    let rgba = images::normalize_to_rgba8(decoded);
    let jpg_bytes = images::encode_jpeg(&rgba, quality, progressive)?;
    tokio::fs::write(jpg, jpg_bytes).await?;
    let _ = tokio::fs::remove_file(png).await;
    Ok(())
}

/// Convert every non-social PNG variant to a JPEG (progressive per
/// `progressive_jpeg`), deleting the source PNG once its JPEG is written.
/// `social` variants are skipped: the social-card feature is unimplemented
/// (see DESIGN.md).
async fn worker_convert_to_jpg(ctx: PipelineContext, tx_next: mpsc::Sender<PendingPage>, item: PendingPage) {
    let pairs: [(&PathBuf, &PathBuf); 8] = [
        (&item.images.png_light.original, &item.images.jpeg_light.original),
        (&item.images.png_light.large, &item.images.jpeg_light.large),
        (&item.images.png_light.medium, &item.images.jpeg_light.medium),
        (&item.images.png_light.small, &item.images.jpeg_light.small),
        (&item.images.png_dark.original, &item.images.jpeg_dark.original),
        (&item.images.png_dark.large, &item.images.jpeg_dark.large),
        (&item.images.png_dark.medium, &item.images.jpeg_dark.medium),
        (&item.images.png_dark.small, &item.images.jpeg_dark.small),
    ];

    for (png, jpg) in pairs {
        if let Err(err) = convert_one_to_jpg(&ctx.gates.png2jpg, ctx.settings.jpeg_quality, ctx.settings.progressive_jpeg, png, jpg).await {
            error!(page_identifier = %item.identifier, %err, png = %png.display(), "failed to convert PNG to JPEG");
        }
    }

    forward(&tx_next, item).await;
}

/// Extract calendar dates mentioned in the page's OCR text.
async fn worker_analyze_text(tx_next: mpsc::Sender<PendingPage>, mut item: PendingPage) {
    match tokio::fs::read_to_string(&item.ocr_text_path).await {
        Ok(text) => item.dates = dates::extract_dates(&text),
        Err(err) => warn!(page_identifier = %item.identifier, %err, "failed to read OCR text for date analysis"),
    }
    forward(&tx_next, item).await;
}

/// Detect cryptonyms mentioned in the page's OCR text, then persist the
/// page's final manifest before handing it to the aggregator.
async fn worker_analyze_cryptonyms(ctx: PipelineContext, tx_next: mpsc::Sender<PendingPage>, mut item: PendingPage) {
    match tokio::fs::read_to_string(&item.ocr_text_path).await {
        Ok(text) => item.cryptonyms = cryptonyms::find_cryptonyms(&text),
        Err(err) => warn!(page_identifier = %item.identifier, %err, "failed to read OCR text for cryptonym analysis"),
    }

    if let Err(err) = record::write_pending_page(&ctx.gates.wjsonfile, &item).await {
        error!(page_identifier = %item.identifier, %err, "failed to persist final page manifest");
    }

    forward(&tx_next, item).await;
}

/// Join handles and the leftover channel halves the aggregator and lifecycle
/// controller need, once every stage dispatcher has been spawned.
pub struct PipelineHandles {
    pub stage_handles: Vec<tokio::task::JoinHandle<()>>,
    pub imported_row_tx: mpsc::Sender<ResultData>,
    pub completed_page_rx: mpsc::Receiver<PendingPage>,
    pub compiled_document_tx: mpsc::Sender<Document>,
    pub compiled_document_rx: mpsc::Receiver<Document>,
}

/// Spawn a dispatcher for every stage from `ImportedRow` through
/// `AnalyzeCryptonyms`, wiring each stage's channel to the next. The
/// `CompletedPage` receiver and `CompiledDocument` channel are left for the
/// aggregator to drive.
pub fn spawn_all(ctx: PipelineContext, channels: Channels) -> PipelineHandles {
    let Channels {
        imported_row,
        extract_text,
        extract_pages,
        generate_png,
        generate_light,
        generate_dark,
        perform_ocr,
        convert_to_jpg,
        analyze_text,
        analyze_cryptonyms,
        completed_page,
        compiled_document,
    } = channels;

    let mut stage_handles = Vec::new();
    let imported_row_tx = imported_row.0;

    {
        let ctx = ctx.clone();
        let tx = extract_text.0.clone();
        stage_handles.push(tokio::spawn(run_stage(imported_row.1, ctx.cancel.clone(), move |item| {
            let ctx = ctx.clone();
            let tx = tx.clone();
            async move { worker_validate(ctx, tx, item).await }
        })));
    }
    {
        let ctx = ctx.clone();
        let tx = extract_pages.0.clone();
        stage_handles.push(tokio::spawn(run_stage(extract_text.1, ctx.cancel.clone(), move |item| {
            let ctx = ctx.clone();
            let tx = tx.clone();
            async move { worker_extract_text(ctx, tx, item).await }
        })));
    }
    {
        let ctx = ctx.clone();
        let tx = generate_png.0.clone();
        stage_handles.push(tokio::spawn(run_stage(extract_pages.1, ctx.cancel.clone(), move |item| {
            let ctx = ctx.clone();
            let tx = tx.clone();
            async move { worker_extract_pages(ctx, tx, item).await }
        })));
    }
    {
        let ctx = ctx.clone();
        let tx = generate_light.0.clone();
        stage_handles.push(tokio::spawn(run_stage(generate_png.1, ctx.cancel.clone(), move |item| {
            let ctx = ctx.clone();
            let tx = tx.clone();
            async move { worker_generate_png(ctx, tx, item).await }
        })));
    }
    {
        let ctx = ctx.clone();
        let tx = generate_dark.0.clone();
        stage_handles.push(tokio::spawn(run_stage(generate_light.1, ctx.cancel.clone(), move |item| {
            let ctx = ctx.clone();
            let tx = tx.clone();
            async move { worker_generate_light(ctx, tx, item).await }
        })));
    }
    {
        let ctx = ctx.clone();
        let tx = perform_ocr.0.clone();
        stage_handles.push(tokio::spawn(run_stage(generate_dark.1, ctx.cancel.clone(), move |item| {
            let ctx = ctx.clone();
            let tx = tx.clone();
            async move { worker_generate_dark(ctx, tx, item).await }
        })));
    }
    {
        let ctx = ctx.clone();
        let tx = convert_to_jpg.0.clone();
        stage_handles.push(tokio::spawn(run_stage(perform_ocr.1, ctx.cancel.clone(), move |item| {
            let ctx = ctx.clone();
            let tx = tx.clone();
            async move { worker_perform_ocr(ctx, tx, item).await }
        })));
    }
    {
        let ctx = ctx.clone();
        let tx = analyze_text.0.clone();
        stage_handles.push(tokio::spawn(run_stage(convert_to_jpg.1, ctx.cancel.clone(), move |item| {
            let ctx = ctx.clone();
            let tx = tx.clone();
            async move { worker_convert_to_jpg(ctx, tx, item).await }
        })));
    }
    {
        let tx = analyze_cryptonyms.0.clone();
        stage_handles.push(tokio::spawn(run_stage(analyze_text.1, ctx.cancel.clone(), move |item| {
            let tx = tx.clone();
            async move { worker_analyze_text(tx, item).await }
        })));
    }
    {
        let ctx = ctx.clone();
        let tx = completed_page.0.clone();
        stage_handles.push(tokio::spawn(run_stage(analyze_cryptonyms.1, ctx.cancel.clone(), move |item| {
            let ctx = ctx.clone();
            let tx = tx.clone();
            async move { worker_analyze_cryptonyms(ctx, tx, item).await }
        })));
    }

    PipelineHandles {
        stage_handles,
        imported_row_tx,
        completed_page_rx: completed_page.1,
        compiled_document_tx: compiled_document.0,
        compiled_document_rx: compiled_document.1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_number_parses_from_pdfcpu_extract_naming() {
        assert_eq!(page_number_from_extracted_name("document_page_7.pdf"), Some(7));
        assert_eq!(page_number_from_extracted_name("document_page_0042.pdf"), Some(42));
    }

    #[test]
    fn page_number_rejects_unexpected_naming() {
        assert_eq!(page_number_from_extracted_name("document.pdf"), None);
        assert_eq!(page_number_from_extracted_name("document_page_seven.pdf"), None);
    }
}
