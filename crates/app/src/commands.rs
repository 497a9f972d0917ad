use std::io::Write;

use api_types::list::{ListDocument, ProductDocument};
use chrono_tz::Tz;
use engine::{
    AuthProvider, Category, Country, EngineError, FilterCriteria, ListManager, LocalAuth,
    LocalBlobStore, Money, ProductDraft, ProfilePicture, Quantity, QuantityUnit,
    RegistrationForm, Session, SqlDocumentStore, ValidationError, View, filter_products,
    unique_brands, unique_categories,
};
use sea_orm::DatabaseConnection;

use crate::{
    cli::{Account, ImportArgs, ProductsArgs, RegisterArgs, RemoveProductArgs, ReportArgs, TrendArgs},
    error::{AppError, Result},
    output, prompt,
};

/// Collaborators shared by every command.
pub struct Context {
    pub database: DatabaseConnection,
    pub blobs: LocalBlobStore,
    pub timezone: Tz,
}

impl Context {
    fn session(&self) -> Session<LocalAuth, SqlDocumentStore> {
        Session::new(
            LocalAuth::new(self.database.clone()),
            SqlDocumentStore::new(self.database.clone()),
        )
        .with_timezone(self.timezone)
    }

    /// Session signed in as `account`, with its saved lists loaded.
    async fn signed_in(&self, account: &Account) -> Result<Session<LocalAuth, SqlDocumentStore>> {
        let mut session = self.session();
        session.attach();

        let password = prompt::password(&format!("Password for {}: ", account.email))?;
        session
            .auth()
            .sign_in_with_email_password(&account.email, &password)
            .await?;

        if session.sync_auth().await != View::Lists {
            return Err(EngineError::Unauthenticated.into());
        }
        session.ensure_loaded().await?;
        Ok(session)
    }
}

pub async fn register(ctx: &Context, args: RegisterArgs) -> Result<()> {
    let picture = ProfilePicture {
        file_name: args
            .picture
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
        bytes: tokio::fs::read(&args.picture).await?,
    };
    let (password, confirm_password) = prompt::new_password()?;

    let form = RegistrationForm {
        name: args.name,
        email: args.email,
        password,
        confirm_password,
        birthdate: Some(args.birthdate),
        country: Some(Country::try_from(args.country.as_str())?),
        picture,
        accepted_terms: args.accept_terms,
    };

    let auth = LocalAuth::new(ctx.database.clone());
    match engine::register(&auth, &ctx.blobs, form).await {
        Ok(user) => {
            println!("Registered {} ({})", user.email, user.id);
            auth.sign_out().await;
            Ok(())
        }
        Err(EngineError::Auth(err)) if err.is_already_registered() => Err(AppError::Invalid(
            format!("{err}, sign in with that account instead"),
        )),
        Err(err) => Err(err.into()),
    }
}

/// Form fields of an imported product. The list store fills in a missing
/// product store.
fn draft_from_document(
    doc: &ProductDocument,
    list_store: &str,
) -> std::result::Result<ProductDraft, ValidationError> {
    let price_text = doc.price.as_text();
    let quantity_text = doc.quantity.as_text();
    Ok(ProductDraft {
        store: doc.store.clone().unwrap_or_else(|| list_store.to_string()),
        name: doc.name.clone(),
        price: price_text.parse::<Money>()?,
        purchase_date: Some(doc.purchase_date),
        quantity: quantity_text.parse::<Quantity>()?,
        quantity_unit: match doc.quantity_unit.as_deref() {
            Some(unit) => QuantityUnit::try_from(unit)?,
            None => QuantityUnit::default(),
        },
        category: Some(Category::try_from(doc.category.as_str())?),
        brand: doc.brand.clone(),
    })
}

/// Build the working list from `doc`. Nothing is saved on error.
fn fill_working_list(
    working: &mut ListManager,
    doc: &ListDocument,
) -> std::result::Result<(), EngineError> {
    working.clear();
    working.set_store(&doc.store);
    for product in &doc.products {
        let draft = draft_from_document(product, &doc.store)?;
        let id = working.add_product(draft)?.id;
        if !product.active {
            working.set_active(id, false)?;
        }
    }
    Ok(())
}

pub async fn import(ctx: &Context, args: ImportArgs) -> Result<()> {
    let raw = tokio::fs::read_to_string(&args.file).await?;
    let documents: Vec<ListDocument> = serde_json::from_str(&raw)?;
    let mut session = ctx.signed_in(&args.account).await?;

    let (mut imported, mut skipped) = (0usize, 0usize);
    for (index, doc) in documents.iter().enumerate() {
        if let Err(err) = fill_working_list(session.working_mut(), doc) {
            tracing::warn!(index, store = %doc.store, "skipping list: {err}");
            session.working_mut().clear();
            skipped += 1;
            continue;
        }
        if doc.created_at.is_none() {
            tracing::warn!(index, store = %doc.store, "list has no valid date, it will not show in monthly reports");
        }
        match session.save_working_list_at(doc.created_at).await {
            Ok(list) => {
                tracing::debug!(list_id = %list.id, "imported list");
                imported += 1;
            }
            Err(err) => {
                tracing::warn!(index, store = %doc.store, "could not save list: {err}");
                session.working_mut().clear();
                skipped += 1;
            }
        }
    }

    println!("Imported {imported} lists, skipped {skipped}");
    session.sign_out().await;
    Ok(())
}

pub async fn report(ctx: &Context, args: ReportArgs) -> Result<()> {
    let mut session = ctx.signed_in(&args.account).await?;
    let report = output::report(session.summary(), &session.history());

    let mut out = std::io::stdout().lock();
    if args.json {
        output::print_json(&mut out, &report)?;
    } else {
        output::print_report(&mut out, &report)?;
    }
    out.flush()?;
    drop(out);

    session.sign_out().await;
    Ok(())
}

pub async fn trend(ctx: &Context, args: TrendArgs) -> Result<()> {
    let mut session = ctx.signed_in(&args.account).await?;
    let trend = output::trend(&args.product, &session.price_trend(&args.product));

    let mut out = std::io::stdout().lock();
    if args.json {
        output::print_json(&mut out, &trend)?;
    } else {
        output::print_trend(&mut out, &trend)?;
    }
    drop(out);

    session.sign_out().await;
    Ok(())
}

pub async fn products(ctx: &Context, args: ProductsArgs) -> Result<()> {
    let mut session = ctx.signed_in(&args.account).await?;
    let views = session.products();
    let criteria = FilterCriteria {
        name: args.name,
        brand: args.brand,
        category: args.category,
        min_price: args.min_price,
        max_price: args.max_price,
    };
    let rows: Vec<_> = filter_products(&views, &criteria)
        .into_iter()
        .map(output::product_row)
        .collect();

    let mut out = std::io::stdout().lock();
    if args.csv {
        output::write_csv(&mut out, &rows)?;
    } else {
        output::print_products(&mut out, &rows)?;
        let categories: Vec<_> = unique_categories(&views)
            .into_iter()
            .map(|c| c.display_name())
            .collect();
        writeln!(out, "\n{} of {} products", rows.len(), views.len())?;
        writeln!(out, "Categories: {}", categories.join(", "))?;
        writeln!(out, "Brands: {}", unique_brands(&views).join(", "))?;
    }
    drop(out);

    session.sign_out().await;
    Ok(())
}

pub async fn remove_product(ctx: &Context, args: RemoveProductArgs) -> Result<()> {
    let mut session = ctx.signed_in(&args.account).await?;
    session.remove_saved_product(args.list, args.product).await?;

    if let Some(list) = session.lists().iter().find(|l| l.id == args.list) {
        println!(
            "Removed product {}; {} now totals {}",
            args.product, list.store, list.total
        );
    }
    session.sign_out().await;
    Ok(())
}
