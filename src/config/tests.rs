use anyhow::Result;

use super::*;

#[tokio::test]
async fn test_mock_config_creation() {
    let config = Config::mock(Data::default());
    assert!(matches!(config, Config::Mock(_)));
}

#[tokio::test]
async fn test_mock_defaults() -> Result<()> {
    let config = Config::mock(Data::default());
    assert_eq!(config.log_level().await?, LogLevel::Warning);
    assert_eq!(config.usize(USizeOpt::PageSize).await?, 20);
    assert_eq!(config.usize(USizeOpt::Timeout).await?, 30);
    assert_eq!(config.usize(USizeOpt::RetryTimeout).await?, 30);
    assert_eq!(config.usize(USizeOpt::MaxRetryAttempts).await?, 10);
    assert_eq!(config.access_token().await?, None);
    Ok(())
}

#[tokio::test]
async fn test_mock_setters() -> Result<()> {
    let config = Config::mock(Data::default());

    config.set_usize(USizeOpt::MaxAge, 7).await?;
    config.set_path(PathOpt::LogDir, PathBuf::from("/custom/logs")).await?;
    config.set_domain(ArcStr::from("https://pump.example")).await?;
    config.set_access_token(Some(ArcStr::from("secret"))).await?;

    assert_eq!(config.usize(USizeOpt::MaxAge).await?, 7);
    assert_eq!(config.path(PathOpt::LogDir).await?, PathBuf::from("/custom/logs"));
    assert_eq!(&*config.domain().await?, "https://pump.example");
    assert_eq!(config.access_token().await?.as_deref(), Some("secret"));
    Ok(())
}

#[tokio::test]
async fn test_actual_config_creates_missing_file() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("nested").join("config.toml");
    let config = Config::spawn(path.clone());

    config.load().await?;

    assert!(path.exists());
    assert_eq!(config.usize(USizeOpt::PageSize).await?, 20);
    Ok(())
}

#[tokio::test]
async fn test_actual_config_reads_partial_file() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        "domain = \"https://pump.example\"\nlog_level = \"error\"\npage_size = 50\n",
    )?;

    let config = Config::spawn(path);
    config.load().await?;

    assert_eq!(&*config.domain().await?, "https://pump.example");
    assert_eq!(config.log_level().await?, LogLevel::Error);
    assert_eq!(config.usize(USizeOpt::PageSize).await?, 50);
    assert_eq!(config.usize(USizeOpt::Timeout).await?, 30);
    Ok(())
}

#[tokio::test]
async fn test_actual_config_save_round_trip() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("config.toml");

    let config = Config::spawn(path.clone());
    config.load().await?;
    config.set_access_token(Some(ArcStr::from("token"))).await?;
    config.set_usize(USizeOpt::RetryTimeout, 5).await?;
    config.save().await?;

    let reloaded = Config::spawn(path);
    reloaded.load().await?;
    assert_eq!(reloaded.access_token().await?.as_deref(), Some("token"));
    assert_eq!(reloaded.usize(USizeOpt::RetryTimeout).await?, 5);
    Ok(())
}

#[tokio::test]
async fn test_invalid_config_is_an_error() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "page_size = \"many\"")?;

    let config = Config::spawn(path);
    assert!(config.load().await.is_err());
    Ok(())
}
