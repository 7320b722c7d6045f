//! Subcommand implementations

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;

use agentseal_a2a::{AnchorSettings, InProcTransport, Requester, Responder, StaticReply};
use agentseal_core::{
    canonical_text, payload_digest, seal, to_wire, MintRequest, NodeApi, ReceiptAnchor,
    SigningClient, TokenStore, Verifier,
};
use agentseal_node::NodeClient;
use agentseal_types::{Did, Envelope, ExchangeStatus, ExecuteRequest, Fragment, SignedPayload};

use crate::config::AppConfig;
use crate::display;

fn node(config: &AppConfig, role: Option<&str>) -> anyhow::Result<Arc<NodeClient>> {
    let env_override = std::env::var("BASE_URL").ok();
    let client = NodeClient::from_config(&config.node, role, env_override.as_deref())?;
    tracing::debug!(base_url = client.base_url(), "Node client ready");
    Ok(Arc::new(client))
}

/// Use the configured DID, or ask the node for the one at `index`.
async fn resolve_did(node: &dyn NodeApi, configured: Option<&str>, index: usize) -> anyhow::Result<Did> {
    match configured {
        Some(did) if !did.is_empty() => Ok(Did::from(did)),
        _ => {
            let did = node
                .discover_did(index)
                .await
                .context("Failed to discover DID from node")?;
            tracing::info!(did = %did, index, "Discovered DID");
            Ok(did)
        }
    }
}

pub async fn whoami(config: &AppConfig, role: Option<&str>, index: Option<usize>) -> anyhow::Result<()> {
    let node = node(config, role)?;
    let index = index.unwrap_or(config.signing.did_index);
    let did = node
        .discover_did(index)
        .await
        .context("Failed to discover DID from node")?;

    display::section("Node Identity");
    display::labeled("Node", node.base_url());
    display::labeled("Index", &index.to_string());
    display::labeled("DID", did.as_str());
    Ok(())
}

pub fn canonicalize(original: &str, response: &str) -> anyhow::Result<()> {
    let canonical = canonical_text(&Envelope::new(original, response))?;
    println!("{}", canonical);
    display::labeled("sha256", &payload_digest(canonical.as_bytes()));
    Ok(())
}

pub async fn sign(
    config: &AppConfig,
    role: Option<&str>,
    original: &str,
    response: &str,
    did: Option<String>,
) -> anyhow::Result<()> {
    let node = node(config, role)?;
    let configured = did.as_deref().or(config.signing.did.as_deref());
    let did = resolve_did(node.as_ref(), configured, config.signing.did_index).await?;

    let signer = SigningClient::new(node, config.signing.password.clone());
    let payload = seal(Envelope::new(original, response), &signer, &did)
        .await
        .context("Signing failed")?;

    println!("{}", to_wire(&payload)?);
    Ok(())
}

pub async fn verify(
    config: &AppConfig,
    role: Option<&str>,
    file: &Path,
    expected: &str,
    peer: &str,
) -> anyhow::Result<()> {
    let content = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let fragments = split_fragments(&content);

    let verifier = Verifier::new(node(config, role)?);
    let result = verifier
        .verify_fragments(peer, fragments.iter().copied(), expected)
        .await;

    display::section("Verification");
    display::verification(&result);
    let status = ExchangeStatus::from_parts(&result.trust_issues, result.error.as_deref());
    display::status(&status);
    println!("{}", serde_json::to_string_pretty(&result)?);

    if !status.is_verified() {
        anyhow::bail!("Verification failed");
    }
    Ok(())
}

/// A whole-file payload is one fragment; otherwise every non-blank line is.
fn split_fragments(content: &str) -> Vec<&str> {
    let whole = content.trim();
    match SignedPayload::parse_fragment(whole) {
        Fragment::Signed(_) => vec![whole],
        Fragment::Content => content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect(),
    }
}

pub async fn mint(
    config: &AppConfig,
    role: Option<&str>,
    metadata: Option<PathBuf>,
    artifact: Option<PathBuf>,
    force: bool,
) -> anyhow::Result<()> {
    let settings = &config.anchor;
    let node = node(config, role)?;
    let did = resolve_did(node.as_ref(), settings.did.as_deref(), config.signing.did_index).await?;

    let request = MintRequest {
        did,
        metadata_path: metadata.unwrap_or_else(|| settings.metadata_path.clone()),
        artifact_path: artifact.unwrap_or_else(|| settings.artifact_path.clone()),
        nft_data: settings.data.clone(),
        nft_value: settings.value,
        quorum_type: settings.quorum_type,
    };
    let anchor = ReceiptAnchor::new(node, settings.password.clone());
    let store = TokenStore::new(settings.token_file.clone());

    display::section("Mint");
    let token = if force {
        let receipt = anchor
            .mint_deploy_and_sign(&request)
            .await
            .context("Minting failed")?;
        store.save(&receipt.token).await?;
        display::labeled("Deploy signature", &receipt.signature);
        receipt.token
    } else {
        store
            .ensure_token(&anchor, &request)
            .await
            .context("Minting failed")?
    };

    display::success("Token ready");
    display::labeled("Token", &token);
    display::labeled("Cached in", &store.path().display().to_string());
    Ok(())
}

pub async fn execute(
    config: &AppConfig,
    role: Option<&str>,
    comment: String,
    data: String,
    token: Option<String>,
    receiver: Option<String>,
) -> anyhow::Result<()> {
    let settings = &config.anchor;
    let token = match token.or_else(|| settings.token.clone()) {
        Some(token) => token,
        None => TokenStore::new(settings.token_file.clone())
            .load()
            .await?
            .context("No token configured; run `agentseal mint` first")?,
    };

    let node = node(config, role)?;
    let configured = settings.executor.as_deref().or(settings.did.as_deref());
    let executor = resolve_did(node.as_ref(), configured, config.signing.did_index).await?;

    let request = ExecuteRequest {
        comment,
        executor: executor.to_string(),
        nft: token,
        nft_data: data,
        nft_value: settings.value,
        quorum_type: settings.quorum_type,
        receiver: receiver.unwrap_or_else(|| settings.receiver.clone()),
    };
    let receipt = ReceiptAnchor::new(node, settings.password.clone())
        .execute_and_sign(&request)
        .await
        .context("Execution failed")?;

    display::section("Execute");
    display::success("Execution anchored");
    display::labeled("Id", &receipt.id);
    display::labeled("Mode", &receipt.mode.to_string());
    display::labeled("Signature", &receipt.signature);
    Ok(())
}

pub async fn exchange(
    config: &AppConfig,
    role: Option<&str>,
    peer: &str,
    task: &str,
    reply: &str,
) -> anyhow::Result<()> {
    let node = node(config, role)?;
    let identity = resolve_did(
        node.as_ref(),
        config.signing.did.as_deref(),
        config.signing.did_index,
    )
    .await?;

    let responder = Responder::new(
        peer,
        identity.clone(),
        SigningClient::new(node.clone(), config.signing.password.clone()),
        Arc::new(StaticReply::new(reply)),
    );
    let transport =
        InProcTransport::new(config.node.timeout()).with_responder(Arc::new(responder));

    let settings = &config.anchor;
    let token = match settings.token.clone() {
        Some(token) => Some(token),
        None => TokenStore::new(settings.token_file.clone()).load().await?,
    };
    let executor = settings
        .executor
        .as_deref()
        .or(settings.did.as_deref())
        .map(Did::from)
        .unwrap_or(identity);

    let requester = Requester::new(
        Arc::new(transport),
        Verifier::new(node.clone()),
        ReceiptAnchor::new(node, settings.password.clone()),
        AnchorSettings {
            executor,
            token,
            value: settings.value,
            quorum_type: settings.quorum_type,
            receiver: settings.receiver.clone(),
        },
    );

    let outcome = requester.exchange(peer, task).await;

    display::section(&format!("Exchange with {}", peer));
    for record in &outcome.messages {
        display::success(&format!("{} signed: {}", record.agent, record.response));
    }
    for issue in &outcome.trust_issues {
        display::error(&issue.to_string());
    }
    display::anchoring(&outcome.anchoring);
    display::status(&outcome.status);

    if !outcome.status.is_verified() {
        anyhow::bail!("Exchange not verified");
    }
    Ok(())
}
