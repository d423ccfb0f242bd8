use anyhow::Result;
use std::fs;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tempfile::TempDir;
use polyphase_sort::external_sort::sort_file_with_shutdown;
use polyphase_sort::{sort_file, CompareMode, ExternalSortConfig, SortError, SortStrategy};

/// Helper function to write one value per line
fn write_values(path: &Path, values: &[String]) -> Result<()> {
    let mut content = values.join("\n");
    content.push('\n');
    fs::write(path, content)?;
    Ok(())
}

fn read_values(path: &Path) -> Result<Vec<String>> {
    Ok(fs::read_to_string(path)?.lines().map(str::to_string).collect())
}

/// Interleaved ascending and descending stretches so the input has many
/// natural runs of uneven length.
fn mixed_runs(count: usize) -> Vec<i64> {
    (0..count as i64)
        .map(|i| match i % 7 {
            0 | 1 | 2 => i * 3 % 101,
            _ => 1000 - (i * 13 % 997),
        })
        .collect()
}

#[tokio::test]
async fn test_end_to_end_numeric_sort() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let input = temp_dir.path().join("numbers.txt");
    let output = temp_dir.path().join("sorted.txt");

    let numbers = mixed_runs(5000);
    write_values(&input, &numbers.iter().map(i64::to_string).collect::<Vec<_>>())?;

    let config = ExternalSortConfig {
        file_count: Some(6),
        compare_mode: CompareMode::Numeric,
        ..Default::default()
    };
    let stats = sort_file(&input, &output, config).await?;

    let mut expected = numbers.clone();
    expected.sort();
    let actual: Vec<i64> = read_values(&output)?
        .iter()
        .map(|v| v.parse())
        .collect::<std::result::Result<_, _>>()?;

    assert_eq!(actual, expected);
    assert_eq!(stats.total_records, 5000);
    assert_eq!(stats.file_count, 6);
    assert!(stats.runs_distributed > 1);
    assert!(stats.merge_levels >= 1);

    Ok(())
}

#[tokio::test]
async fn test_default_file_count_for_small_input() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let input = temp_dir.path().join("words.txt");
    let output = temp_dir.path().join("sorted.txt");

    let words: Vec<String> = ["pear", "apple", "fig", "kiwi", "banana", "apple"]
        .iter()
        .map(|w| w.to_string())
        .collect();
    write_values(&input, &words)?;

    let stats = sort_file(&input, &output, ExternalSortConfig::default()).await?;

    assert_eq!(stats.file_count, 2);
    assert_eq!(
        read_values(&output)?,
        vec!["apple", "apple", "banana", "fig", "kiwi", "pear"]
    );

    Ok(())
}

#[tokio::test]
async fn test_working_files_in_separate_directory() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let work_dir = temp_dir.path().join("work");
    let input = temp_dir.path().join("input.txt");
    let output = temp_dir.path().join("out").join("sorted.txt");
    fs::create_dir_all(output.parent().unwrap())?;

    let values: Vec<String> = (0..300).rev().map(|i| format!("{:04}", i)).collect();
    write_values(&input, &values)?;

    let config = ExternalSortConfig {
        file_count: Some(3),
        temp_directory: Some(work_dir.clone()),
        ..Default::default()
    };
    sort_file(&input, &output, config).await?;

    let mut expected = values.clone();
    expected.sort();
    assert_eq!(read_values(&output)?, expected);
    assert_eq!(fs::read_dir(&work_dir)?.count(), 0);

    Ok(())
}

#[tokio::test]
async fn test_baseline_strategy() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let input = temp_dir.path().join("input.txt");
    let output = temp_dir.path().join("sorted.txt");

    let numbers = mixed_runs(2000);
    write_values(&input, &numbers.iter().map(i64::to_string).collect::<Vec<_>>())?;

    let config = ExternalSortConfig {
        strategy: SortStrategy::Baseline,
        compare_mode: CompareMode::Numeric,
        ..Default::default()
    };
    let stats = sort_file(&input, &output, config).await?;

    let mut expected = numbers.clone();
    expected.sort();
    let actual: Vec<i64> = read_values(&output)?
        .iter()
        .map(|v| v.parse())
        .collect::<std::result::Result<_, _>>()?;
    assert_eq!(actual, expected);
    assert_eq!(stats.strategy, SortStrategy::Baseline);
    assert!(stats.chunks_created >= 1);

    Ok(())
}

#[tokio::test]
async fn test_cancelled_sort_leaves_no_output() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let input = temp_dir.path().join("input.txt");
    let output = temp_dir.path().join("sorted.txt");
    write_values(&input, &["c".to_string(), "b".to_string(), "a".to_string()])?;

    let result = sort_file_with_shutdown(
        &input,
        &output,
        ExternalSortConfig::default(),
        Arc::new(AtomicBool::new(true)),
    )
    .await;

    let err = result.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<SortError>(),
        Some(SortError::Cancelled { .. })
    ));
    assert!(!output.exists());

    Ok(())
}

#[tokio::test]
async fn test_malformed_numeric_input() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let input = temp_dir.path().join("input.txt");
    let output = temp_dir.path().join("sorted.txt");
    fs::write(&input, "1\n2\n3.5\n")?;

    let config = ExternalSortConfig {
        compare_mode: CompareMode::Numeric,
        ..Default::default()
    };
    let err = sort_file(&input, &output, config).await.unwrap_err();

    match err.downcast_ref::<SortError>() {
        Some(SortError::MalformedRecord { line_number, .. }) => assert_eq!(*line_number, 3),
        other => panic!("unexpected error: {:?}", other),
    }

    Ok(())
}

#[tokio::test]
async fn test_config_validation() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let input = temp_dir.path().join("input.txt");
    write_values(&input, &["a".to_string()])?;

    let config = ExternalSortConfig {
        file_count: Some(1),
        ..Default::default()
    };
    let result = sort_file(&input, &temp_dir.path().join("out.txt"), config).await;
    assert!(result.is_err());

    let config_path = temp_dir.path().join("config.json");
    fs::write(&config_path, r#"{ "file_count": 3, "compare_mode": "numeric" }"#)?;
    let loaded = ExternalSortConfig::from_file(&config_path)?;
    assert_eq!(loaded.file_count, Some(3));
    assert_eq!(loaded.compare_mode, CompareMode::Numeric);
    assert_eq!(loaded.strategy, SortStrategy::Polyphase);

    Ok(())
}
