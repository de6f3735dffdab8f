use anyhow::Result;
use igcpanel::{
    panel::{Imputation, ModelSpec},
    DomainPolicy, PanelBuilder, PanelError, PipelineConfig, TETO_START_YEAR,
};
use std::io::{Cursor, Write};
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use zip::{write::SimpleFileOptions, CompressionMethod, ZipWriter};

fn init_test_logging() {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,igcpanel=debug")),
        )
        .with_test_writer()
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

/// Two universities over 2016–2020; A/2018 IGC not published.
const SCENARIO_A: &str = "\
Universidade,Ano ,Orçamento(GND 3+4),IGC (Contínuo),Regiao
UFB,2016,2000000,2.5,NE
UFA,2016,1000000,2.0,SE
UFA,2017,1100000,3.0,SE
UFA,2018,1200000,,SE
UFA,2019,1300000,4.0,SE
UFA,2020,1250000,4.1,SE
UFB,2017,2100000,2.6,NE
UFB,2018,2200000,2.7,NE
UFB,2019,2300000,2.8,NE
UFB,2020,2400000,,NE
";

#[test]
fn scenario_a_interpolation_and_treatment() -> Result<()> {
    init_test_logging();
    let panel = PanelBuilder::default().build("dados.csv", SCENARIO_A.as_bytes())?;
    assert_eq!(panel.len(), 10);

    // sorted entity-major, year-minor
    let keys: Vec<(&str, i32)> = panel
        .records()
        .iter()
        .map(|r| (r.universidade.as_str(), r.ano))
        .collect();
    let mut sorted = keys.clone();
    sorted.sort();
    assert_eq!(keys, sorted);

    let a = panel.entity("UFA").unwrap();
    assert_eq!(a[2].ano, 2018);
    assert_eq!(a[2].igc, Some((3.0 + 4.0) / 2.0));
    assert_eq!(a[2].igc_imputed, Some(Imputation::Interpolated));

    // trailing gap is a projection of the last known value
    let b = panel.entity("UFB").unwrap();
    assert_eq!(b[4].igc, Some(2.8));
    assert_eq!(b[4].igc_imputed, Some(Imputation::Carried));

    for r in panel.records() {
        assert_eq!(r.pos_teto == 1, r.ano >= TETO_START_YEAR);
        assert_eq!(r.interacao, r.ln_orcamento.map(|v| v * f64::from(r.pos_teto)));
        let orc = r.orcamento.unwrap();
        assert_eq!(r.orcamento_milhoes, Some(orc / 1_000_000.0));
        assert!((r.ln_orcamento.unwrap() - orc.ln()).abs() < 1e-12);
    }
    assert!(panel.issues().is_empty());
    Ok(())
}

#[test]
fn scenario_b_zero_budget_is_flagged_not_dropped() -> Result<()> {
    init_test_logging();
    let csv = "Universidade,Ano,Orcamento,IGC\nUFA,2016,1000000,3\nUFA,2017,0,3.1\nUFA,2018,1200000,3.2\n";
    let panel = PanelBuilder::default().build("dados.csv", csv.as_bytes())?;

    assert_eq!(panel.len(), 3, "row must stay in the panel");
    let zero = &panel.records()[1];
    assert_eq!(zero.orcamento, Some(0.0));
    assert_eq!(zero.ln_orcamento, None);
    assert_eq!(zero.interacao, None);

    assert_eq!(panel.issues().len(), 1);
    let issue = &panel.issues()[0];
    assert_eq!((issue.row, issue.year, issue.entity.as_str()), (2, 2017, "UFA"));

    for spec in ModelSpec::ALL {
        let frame = panel.model_frame(spec);
        assert_eq!(frame.excluded_rows, vec![2], "{}", spec);
        assert_eq!(frame.rows.len(), 2);
    }

    let rejecting = PanelBuilder::new(PipelineConfig {
        domain: DomainPolicy::Reject,
        ..PipelineConfig::default()
    });
    let err = rejecting.build("dados.csv", csv.as_bytes()).unwrap_err();
    assert!(err.to_string().contains("row 2 (UFA, 2017)"), "{}", err);
    Ok(())
}

#[test]
fn building_twice_gives_identical_panels() -> Result<()> {
    let builder = PanelBuilder::default();
    let first = builder.build("dados.csv", SCENARIO_A.as_bytes())?;
    let second = builder.build("dados.csv", SCENARIO_A.as_bytes())?;
    assert_eq!(first, second);
    Ok(())
}

#[test]
fn missing_igc_column_is_schema_error() {
    let csv = "Universidade,Ano,Orcamento\nUFA,2016,10\n";
    match PanelBuilder::default().build("dados.csv", csv.as_bytes()) {
        Err(PanelError::Schema { missing }) => assert_eq!(missing, vec!["IGC".to_string()]),
        other => panic!("expected schema error, got {:?}", other),
    }
}

#[test]
fn semicolon_latin1_file_on_disk() -> Result<()> {
    init_test_logging();
    let text = "Universidade;Ano;Orçamento(GND 3+4);IGC (Continuo)\n\
UFPE;2016;1.500.000,00;3,0\n\
UFPE;2017;1.600.000,00;\n\
UFPE;2018;1.700.000,00;3,4\n";
    let latin1: Vec<u8> = text.chars().map(|c| c as u32 as u8).collect();

    let dir = tempfile::tempdir()?;
    let path = dir.path().join("Base_federais.csv");
    std::fs::write(&path, latin1)?;

    let panel = PanelBuilder::default().build_path(&path)?;
    assert_eq!(panel.source(), "Base_federais.csv");
    let recs = panel.records();
    assert_eq!(recs[0].orcamento, Some(1_500_000.0));
    assert_eq!(recs[0].orcamento_milhoes, Some(1.5));
    assert!((recs[1].igc.unwrap() - 3.2).abs() < 1e-12);
    Ok(())
}

#[test]
fn trailing_field_left_out_reads_as_missing() -> Result<()> {
    let csv = "Universidade,Ano,Orcamento,IGC\nA,2018,100,3\nA,2019,100\n";
    let panel = PanelBuilder::default().build("dados.csv", csv.as_bytes())?;
    let recs = panel.records();
    assert_eq!(recs.len(), 2);
    assert_eq!(recs[1].orcamento, Some(100.0));
    // the unpublished IGC is a trailing gap, carried forward
    assert_eq!(recs[1].igc, Some(3.0));
    assert_eq!(recs[1].igc_imputed, Some(Imputation::Carried));
    Ok(())
}

#[test]
fn whole_budgets_with_dot_grouping() -> Result<()> {
    let csv = "Universidade;Ano;Orcamento;IGC\nUFPE;2016;1.500.000;3.5\nUFPE;2017;12.250.000;3,6\n";
    let panel = PanelBuilder::default().build("dados.csv", csv.as_bytes())?;
    let recs = panel.records();
    assert_eq!(recs[0].orcamento, Some(1_500_000.0));
    assert_eq!(recs[1].orcamento_milhoes, Some(12.25));
    assert_eq!(recs[0].igc, Some(3.5));
    assert_eq!(recs[1].igc, Some(3.6));
    Ok(())
}

/// Smallest xlsx calamine accepts: workbook, one sheet, shared strings.
fn minimal_xlsx(shared: &[&str], sheet_rows: &str) -> Result<Vec<u8>> {
    const RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#;
    const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/><Override PartName="/xl/sharedStrings.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml"/></Types>"#;
    const WORKBOOK: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="Dados" sheetId="1" r:id="rId1"/></sheets></workbook>"#;
    const WORKBOOK_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings" Target="sharedStrings.xml"/></Relationships>"#;

    let sst: String = shared
        .iter()
        .map(|s| format!(r#"<si><t xml:space="preserve">{}</t></si>"#, s))
        .collect();
    let shared_strings = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="{n}" uniqueCount="{n}">{sst}</sst>"#,
        n = shared.len()
    );
    let sheet = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>{}</sheetData></worksheet>"#,
        sheet_rows
    );

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    for (name, body) in [
        ("[Content_Types].xml", CONTENT_TYPES.to_string()),
        ("_rels/.rels", RELS.to_string()),
        ("xl/workbook.xml", WORKBOOK.to_string()),
        ("xl/_rels/workbook.xml.rels", WORKBOOK_RELS.to_string()),
        ("xl/sharedStrings.xml", shared_strings),
        ("xl/worksheets/sheet1.xml", sheet),
    ] {
        zip.start_file(name, options)?;
        zip.write_all(body.as_bytes())?;
    }
    Ok(zip.finish()?.into_inner())
}

#[test]
fn spreadsheet_first_sheet() -> Result<()> {
    init_test_logging();
    let shared = ["Universidade", "Ano ", "Orçamento(GND 3+4)", "IGC (Contínuo)", "UFMG"];
    let rows = r#"<row r="1"><c r="A1" t="s"><v>0</v></c><c r="B1" t="s"><v>1</v></c><c r="C1" t="s"><v>2</v></c><c r="D1" t="s"><v>3</v></c></row><row r="2"><c r="A2" t="s"><v>4</v></c><c r="B2"><v>2017</v></c><c r="C2"><v>2000000</v></c><c r="D2"><v>3.5</v></c></row><row r="3"><c r="A3" t="s"><v>4</v></c><c r="B3"><v>2016</v></c><c r="C3"><v>1000000</v></c></row>"#;
    let bytes = minimal_xlsx(&shared, rows)?;

    let panel = PanelBuilder::default().build("Base.xlsx", &bytes)?;
    let recs = panel.records();
    assert_eq!(recs.len(), 2);
    assert_eq!((recs[0].ano, recs[1].ano), (2016, 2017));
    assert_eq!(recs[0].igc, None, "leading gap stays missing");
    assert_eq!(recs[1].igc, Some(3.5));
    assert_eq!(recs[1].orcamento_milhoes, Some(2.0));
    assert_eq!(recs[0].pos_teto, 0);
    Ok(())
}

#[test]
fn unreadable_spreadsheet_is_ingest_error() {
    let err = PanelBuilder::default()
        .build("Base.xlsx", b"Universidade,Ano\n")
        .unwrap_err();
    assert!(matches!(err, PanelError::Ingest { ref file, .. } if file == "Base.xlsx"));
}
