use anyhow::Result;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

use tariff_recon::config::ValidatorConfig;
use tariff_recon::error::ValidationError;
use tariff_recon::validator::export::export_csv;
use tariff_recon::validator::{
    validate, Category, ChunkedCsvReader, HistoryEntry, HistoryStore, RawRow,
    ReconciliationEngine, ReportFilter,
};

const TARIF_HEADER: &str = "SYS_CODE,ORIGIN,DESTINATION,SERVICE,TARIF,SLA_FORM,SLA_THRU";

/// Write master and source CSV content into a fresh temp directory.
fn write_inputs(temp_dir: &TempDir, master: &str, source: &str) -> (PathBuf, PathBuf) {
    let master_path = temp_dir.path().join("master.csv");
    let source_path = temp_dir.path().join("source.csv");
    fs::write(&master_path, master).unwrap();
    fs::write(&source_path, source).unwrap();
    (master_path, source_path)
}

#[tokio::test]
async fn test_end_to_end_tarif_validation() -> Result<()> {
    let temp_dir = TempDir::new()?;

    // Master uses semicolons and differently-worded headers; resolution is
    // per file, so the source's comma layout still reconciles against it.
    let master = "KODE SYSTEM;ORIGIN;DESTINATION;SERVICE;TARIF;SLA FORM;SLA THRU\n\
                  JKT10BDO10;JAKARTA;BANDUNG;REGULER;9500;2;3\n\
                  JKT10MES10;JAKARTA;MEDAN;REGULER;24000;4;6\n";
    let source = format!(
        "{}\njkt10bdo10,JAKARTA,BANDUNG,REGULER,9500,2,3\n\
         JKT10MES10,JAKARTA,MEDAN,REGULER,25000,4,6\n\
         JKT10PDG10,JAKARTA,PADANG,REGULER,30000,5,7\n",
        TARIF_HEADER
    );
    let (master_path, source_path) = write_inputs(&temp_dir, master, &source);

    let result = validate(&master_path, &source_path, Category::Tarif).await?;

    assert_eq!(result.total_rows, 3);
    assert_eq!(result.matches, 1);
    assert_eq!(result.mismatches.len(), 1);
    assert_eq!(result.blanks, 1);
    assert_eq!(result.full_report[0].keterangan, "Sesuai");
    assert_eq!(result.full_report[1].keterangan, "Tidak sesuai: Tarif");
    assert_eq!(result.full_report[2].keterangan, "Master Data Tidak Ada");
    assert_eq!(result.mismatches[0].row_id, 2);

    // The run lands in a persisted history, newest first.
    let history_path = temp_dir.path().join("state").join("history.json");
    let store = HistoryStore::new(&history_path, Some(10));
    let mut history = store.load()?;
    history.append(HistoryEntry::new(
        "master.csv".to_string(),
        "source.csv".to_string(),
        Category::Tarif,
        result.clone(),
    ));
    store.save(&history)?;

    let reloaded = store.load()?;
    assert_eq!(reloaded.len(), 1);
    assert_eq!(reloaded.latest().unwrap().result, result);

    Ok(())
}

#[tokio::test]
async fn test_chunk_boundary_idempotence() -> Result<()> {
    let temp_dir = TempDir::new()?;

    // Multi-byte characters force window boundaries inside UTF-8 sequences
    // when windows are a single byte.
    let master = format!(
        "{}\nABC1,JAKARTA,Médan Kota,REGULER,59000,3,5\n",
        TARIF_HEADER
    );
    let source = format!(
        "{}\nABC1,JAKARTA,Médan Kota,REGULER,59000,3,5\nZZZ9,JAKARTA,Padang,REGULER,10000,1,2\n",
        TARIF_HEADER
    );
    let (master_path, source_path) = write_inputs(&temp_dir, &master, &source);

    let tiny = ReconciliationEngine::new(1)
        .validate(&master_path, &source_path, Category::Tarif, |_| {})
        .await?;
    let large = ReconciliationEngine::default()
        .validate(&master_path, &source_path, Category::Tarif, |_| {})
        .await?;

    assert_eq!(tiny, large);
    assert_eq!(tiny.total_rows, 2);
    assert_eq!(tiny.full_report[0].destination, "Médan Kota");

    Ok(())
}

#[tokio::test]
async fn test_determinism_across_runs() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let master = format!("{}\nABC1,JAKARTA,BANDUNG,REGULER,59000,3,5\n", TARIF_HEADER);
    let source = format!(
        "{}\nABC1,JAKARTA,BANDUNG,REGULER,60000,3,5\nZZZ9,JAKARTA,MEDAN,REGULER,100,1,1\n",
        TARIF_HEADER
    );
    let (master_path, source_path) = write_inputs(&temp_dir, &master, &source);

    let first = validate(&master_path, &source_path, Category::Tarif).await?;
    let second = validate(&master_path, &source_path, Category::Tarif).await?;

    assert_eq!(first, second);

    Ok(())
}

#[tokio::test]
async fn test_export_round_trips_through_reader() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let original = "He said \"hi\", twice";

    // A field holding both a comma and a quote must survive export and
    // re-parse exactly.
    let master = format!(
        "{}\nABC1,\"He said \"\"hi\"\", twice\",BANDUNG,REGULER,59000,3,5\n",
        TARIF_HEADER
    );
    let source = master.clone();
    let (master_path, source_path) = write_inputs(&temp_dir, &master, &source);

    let result = validate(&master_path, &source_path, Category::Tarif).await?;
    assert_eq!(result.full_report[0].origin, original);

    let rows = result.filtered(ReportFilter::All);
    let bytes = export_csv(&rows, Category::Tarif)?;
    let export_path = temp_dir.path().join("export.csv");
    fs::write(&export_path, bytes)?;

    let mut parsed: Vec<RawRow> = Vec::new();
    ChunkedCsvReader::default()
        .read_chunked(&export_path, |rows| parsed.extend(rows), |_| {})
        .await?;

    assert_eq!(parsed.len(), 1);
    assert_eq!(parsed[0].field("Origin"), original);

    Ok(())
}

#[tokio::test]
async fn test_missing_input_is_not_started() {
    let temp_dir = TempDir::new().unwrap();
    let master_path = temp_dir.path().join("absent.csv");
    let source_path = temp_dir.path().join("also_absent.csv");

    let err = validate(&master_path, &source_path, Category::Tarif)
        .await
        .unwrap_err();
    assert!(matches!(err, ValidationError::InputMissing { .. }));
}

#[tokio::test]
async fn test_invalid_utf8_aborts_the_run() {
    let temp_dir = TempDir::new().unwrap();
    let master_path = temp_dir.path().join("master.csv");
    let source_path = temp_dir.path().join("source.csv");

    let mut corrupt = format!("{}\nABC1,JAK", TARIF_HEADER).into_bytes();
    corrupt.push(0xFF);
    corrupt.extend_from_slice(b"ARTA,BANDUNG,REGULER,59000,3,5\n");
    fs::write(&master_path, &corrupt).unwrap();
    fs::write(&source_path, format!("{}\n", TARIF_HEADER)).unwrap();

    let err = validate(&master_path, &source_path, Category::Tarif)
        .await
        .unwrap_err();
    assert!(matches!(err, ValidationError::Decode { .. }));
}

#[tokio::test]
async fn test_progress_is_monotonic_and_blended() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let master = format!("{}\nABC1,JAKARTA,BANDUNG,REGULER,59000,3,5\n", TARIF_HEADER);
    let source = format!("{}\nABC1,JAKARTA,BANDUNG,REGULER,59000,3,5\n", TARIF_HEADER);
    let (master_path, source_path) = write_inputs(&temp_dir, &master, &source);

    let mut reported: Vec<f64> = Vec::new();
    // A tiny window size produces many progress reports per pass.
    ReconciliationEngine::new(8)
        .validate(&master_path, &source_path, Category::Tarif, |percent| {
            reported.push(percent)
        })
        .await?;

    assert!(!reported.is_empty());
    assert!(reported.windows(2).all(|w| w[0] <= w[1]));
    assert!(reported.iter().all(|p| (0.0..=100.0).contains(p)));
    // Master pass occupies the first 30 percent, the source pass the rest.
    assert!(reported.first().unwrap() <= &30.0);
    assert_eq!(*reported.last().unwrap(), 100.0);

    Ok(())
}

#[tokio::test]
async fn test_filter_pages_compose_back_to_the_filtered_report() -> Result<()> {
    let temp_dir = TempDir::new()?;

    let mut master = String::from(TARIF_HEADER);
    master.push('\n');
    let mut source = String::from(TARIF_HEADER);
    source.push('\n');
    for i in 0..120 {
        // Keys M* exist in master; rows alternate match/mismatch; B* rows
        // have no master counterpart.
        if i % 3 == 2 {
            source.push_str(&format!("B{i},JAKARTA,KOTA{i},REGULER,1000,1,2\n"));
        } else {
            master.push_str(&format!("M{i},JAKARTA,KOTA{i},REGULER,1000,1,2\n"));
            let tarif = if i % 3 == 0 { 1000 } else { 2000 };
            source.push_str(&format!("M{i},JAKARTA,KOTA{i},REGULER,{tarif},1,2\n"));
        }
    }
    let (master_path, source_path) = write_inputs(&temp_dir, &master, &source);

    let result = validate(&master_path, &source_path, Category::Tarif).await?;
    assert_eq!(result.total_rows, 120);
    assert_eq!(
        result.matches + result.mismatches.len() + result.blanks,
        result.total_rows
    );

    for filter in [
        ReportFilter::All,
        ReportFilter::Match,
        ReportFilter::Mismatch,
        ReportFilter::Blank,
    ] {
        let filtered = result.filtered(filter);
        let mut collected = Vec::new();
        let mut page_number = 1;
        loop {
            let page = result.page(filter, page_number);
            if page.is_empty() {
                break;
            }
            assert!(page.len() <= 50);
            assert!(page.iter().all(|row| filter.matches(&row.keterangan)));
            collected.extend(page);
            page_number += 1;
        }
        assert_eq!(collected.len(), filtered.len());
        for (a, b) in collected.iter().zip(filtered.iter()) {
            assert_eq!(a.code, b.code);
        }
    }

    Ok(())
}

#[tokio::test]
async fn test_empty_master_classifies_everything_blank() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let source = format!("{}\nABC1,JAKARTA,BANDUNG,REGULER,59000,3,5\n", TARIF_HEADER);
    let (master_path, source_path) = write_inputs(&temp_dir, "", &source);

    let result = validate(&master_path, &source_path, Category::Tarif).await?;
    assert_eq!(result.total_rows, 1);
    assert_eq!(result.blanks, 1);
    assert_eq!(result.full_report[0].keterangan, "Master Data Tidak Ada");

    Ok(())
}

#[tokio::test]
async fn test_empty_source_yields_empty_result() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let master = format!("{}\nABC1,JAKARTA,BANDUNG,REGULER,59000,3,5\n", TARIF_HEADER);
    let (master_path, source_path) = write_inputs(&temp_dir, &master, "");

    let result = validate(&master_path, &source_path, Category::Tarif).await?;
    assert_eq!(result.total_rows, 0);
    assert!(result.full_report.is_empty());
    assert!(result.mismatches.is_empty());

    Ok(())
}

#[test]
fn test_config_round_trip_and_validation() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("config.json");

    let mut config = ValidatorConfig::default();
    assert!(config.validate().is_ok());
    config.chunk_size_mb = 4;
    config.to_file(&path)?;

    let loaded = ValidatorConfig::from_file(&path)?;
    assert_eq!(loaded.chunk_size_mb, 4);
    assert_eq!(loaded.history_capacity(), Some(50));

    config.chunk_size_mb = 0;
    assert!(config.validate().is_err());
    config.chunk_size_mb = 1000;
    assert!(config.validate().is_err());

    Ok(())
}
