//! Giao diện báo cáo huyết học cho môi trường WebAssembly.

pub mod view_model;

#[cfg(target_arch = "wasm32")]
mod storage;
#[cfg(target_arch = "wasm32")]
mod styles;

#[cfg(target_arch = "wasm32")]
pub use storage::LocalStorageBackend;

#[cfg(target_arch = "wasm32")]
mod wasm_ui {
    use crate::storage::LocalStorageBackend;
    use crate::styles;
    use crate::view_model::{
        clinic_line, display_or_placeholder, history_subtitle, history_title, patient_fields,
        row_class,
    };
    use chrono::Local;
    use serde_wasm_bindgen::from_value;
    use vetreport_core::{
        validate_upload, HistoryStore, PatientData, ReportConfig, ReportData, ReportError,
        ReportLayout, ResultRow, Species,
    };
    use vetreport_csv::{parse_csv_str, ParsedCsv};
    use wasm_bindgen::prelude::*;
    use wasm_bindgen::JsCast;
    use web_sys::{
        console, Document, Element, Event, File, FileReader, HtmlInputElement, HtmlSelectElement,
        ProgressEvent, Window,
    };
    use yew::events::{InputEvent, SubmitEvent};
    use yew::prelude::*;
    use yew::TargetCast;

    const IDLE_STATUS: &str = "Đang chờ tệp CSV...";

    #[derive(Clone, PartialEq)]
    struct Toast {
        id: u32,
        title: &'static str,
        message: String,
    }

    #[derive(Clone, Copy, PartialEq)]
    enum Screen {
        Form,
        Report,
    }

    type Notify = Callback<(&'static str, String)>;

    #[derive(Properties, PartialEq)]
    pub struct ReportAppProps {
        pub config: ReportConfig,
    }

    #[function_component(ReportApp)]
    fn report_app(props: &ReportAppProps) -> Html {
        use_effect_with((), |_| {
            if let Some(window) = web_sys::window() {
                if let Some(document) = window.document() {
                    if let Err(err) = styles::ensure_styles(&document) {
                        console::error_1(&err);
                    }
                }
            }
            || ()
        });

        let store = use_mut_ref(|| HistoryStore::open(LocalStorageBackend::new()));
        let history = {
            let store = store.clone();
            use_state(move || store.borrow().entries().to_vec())
        };
        let screen = use_state(|| Screen::Form);
        let active = use_state(|| None::<ReportData>);
        let toasts = use_state(Vec::<Toast>::new);
        let toast_seq = use_mut_ref(|| 0u32);

        let notify: Notify = {
            let toasts = toasts.clone();
            Callback::from(move |(title, message): (&'static str, String)| {
                let mut seq = toast_seq.borrow_mut();
                *seq += 1;
                let mut next = (*toasts).clone();
                next.push(Toast {
                    id: *seq,
                    title,
                    message,
                });
                toasts.set(next);
            })
        };

        let on_dismiss = {
            let toasts = toasts.clone();
            Callback::from(move |id: u32| {
                let next = toasts.iter().filter(|t| t.id != id).cloned().collect();
                toasts.set(next);
            })
        };

        let show_form = {
            let screen = screen.clone();
            let active = active.clone();
            Callback::from(move |_: ()| {
                active.set(None);
                screen.set(Screen::Form);
            })
        };

        let on_generated = {
            let store = store.clone();
            let history = history.clone();
            let screen = screen.clone();
            let active = active.clone();
            let notify = notify.clone();
            Callback::from(move |report: ReportData| {
                let mut store = store.borrow_mut();
                if let Err(err) = store.upsert(report.clone()) {
                    notify.emit(("Không lưu được lịch sử", err.to_string()));
                }
                history.set(store.entries().to_vec());
                set_document_title(&format!("Báo cáo - {}", report.patient.id));
                active.set(Some(report));
                screen.set(Screen::Report);
            })
        };

        let on_select = {
            let screen = screen.clone();
            let active = active.clone();
            Callback::from(move |report: ReportData| {
                active.set(Some(report));
                screen.set(Screen::Report);
            })
        };

        let on_delete = {
            let store = store.clone();
            let history = history.clone();
            let active = active.clone();
            let show_form = show_form.clone();
            let notify = notify.clone();
            Callback::from(move |id: String| {
                let mut store = store.borrow_mut();
                if let Err(err) = store.delete(&id) {
                    notify.emit(("Không xóa được báo cáo", err.to_string()));
                }
                history.set(store.entries().to_vec());
                if (*active).as_ref().map(|r| r.patient.id == id).unwrap_or(false) {
                    show_form.emit(());
                }
            })
        };

        let on_clear = {
            let store = store.clone();
            let history = history.clone();
            let show_form = show_form.clone();
            let notify = notify.clone();
            Callback::from(move |_: MouseEvent| {
                let mut store = store.borrow_mut();
                if let Err(err) = store.clear() {
                    notify.emit(("Không xóa được lịch sử", err.to_string()));
                }
                history.set(store.entries().to_vec());
                show_form.emit(());
            })
        };

        let body = match (*screen, (*active).clone()) {
            (Screen::Report, Some(report)) => html! {
                <ReportView
                    report={report}
                    config={props.config.clone()}
                    on_reset={show_form.clone()}
                />
            },
            _ => html! {
                <>
                    <UploadPanel
                        config={props.config.clone()}
                        notify={notify.clone()}
                        on_generated={on_generated}
                    />
                    <section class="report-card no-print">
                        <div class="history-toolbar">
                            <h2>{"Lịch sử báo cáo"}</h2>
                            <button
                                type="button"
                                class="is-danger"
                                onclick={on_clear}
                                disabled={history.is_empty()}
                            >
                                {"Xóa lịch sử"}
                            </button>
                        </div>
                        <HistoryList
                            entries={(*history).clone()}
                            on_select={on_select}
                            on_delete={on_delete}
                        />
                    </section>
                </>
            },
        };

        html! {
            <div class="report-root">
                <div class="toast-region" role="status" aria-live="assertive">
                    { for toasts.iter().map(|toast| render_toast(toast, on_dismiss.clone())) }
                </div>
                { body }
            </div>
        }
    }

    fn render_toast(toast: &Toast, on_dismiss: Callback<u32>) -> Html {
        let id = toast.id;
        let onclick = Callback::from(move |_| on_dismiss.emit(id));
        html! {
            <div class="toast">
                <div>
                    <strong>{ toast.title }</strong>
                    <span>{ toast.message.clone() }</span>
                </div>
                <button type="button" class="is-secondary" onclick={onclick} aria-label="Đóng thông báo">{"×"}</button>
            </div>
        }
    }

    #[derive(Properties, PartialEq)]
    struct UploadPanelProps {
        config: ReportConfig,
        notify: Notify,
        on_generated: Callback<ReportData>,
    }

    #[function_component(UploadPanel)]
    fn upload_panel(props: &UploadPanelProps) -> Html {
        let is_loading = use_state(|| false);
        let status = use_state(|| IDLE_STATUS.to_string());
        let parsed = use_state(|| None::<ParsedCsv>);
        let patient = use_state(PatientData::default);
        let species = use_state(|| props.config.default_species);
        let file_input = use_node_ref();

        let on_pick = {
            let file_input = file_input.clone();
            Callback::from(move |_: MouseEvent| {
                if let Some(input) = file_input.cast::<HtmlInputElement>() {
                    input.click();
                }
            })
        };

        let on_text = {
            let is_loading = is_loading.clone();
            let status = status.clone();
            let parsed = parsed.clone();
            let patient = patient.clone();
            let species = species.clone();
            let notify = props.notify.clone();
            let config = props.config.clone();
            Callback::from(move |text: Result<String, String>| {
                is_loading.set(false);
                let text = match text {
                    Ok(text) => text,
                    Err(message) => {
                        notify.emit(("Lỗi đọc tệp", ReportError::Read(message).to_string()));
                        status.set("Không đọc được tệp.".to_string());
                        return;
                    }
                };

                match parse_csv_str(&text, &config) {
                    Ok(csv) => {
                        status.set(format!("Đã đọc mẫu '{}'. Hoàn tất thông tin bệnh nhân.", csv.patient.id));
                        species.set(csv.species_or(&config));
                        patient.set(csv.patient.clone());
                        parsed.set(Some(csv));
                    }
                    Err(err) => {
                        notify.emit(("Lỗi xử lý", err.to_string()));
                        status.set("Lỗi khi xử lý tệp. Hãy thử lại.".to_string());
                    }
                }
            })
        };

        let on_file = {
            let is_loading = is_loading.clone();
            let status = status.clone();
            let notify = props.notify.clone();
            Callback::from(move |event: Event| {
                let input: HtmlInputElement = event.target_unchecked_into();
                let file = input.files().and_then(|files| files.get(0));
                input.set_value("");
                let Some(file) = file else {
                    return;
                };
                if *is_loading {
                    return;
                }

                let mime = file.type_();
                if let Err(err) = validate_upload(&file.name(), Some(mime.as_str())) {
                    notify.emit(("Tệp không hợp lệ", err.to_string()));
                    return;
                }

                is_loading.set(true);
                status.set("Đang xử lý tệp...".to_string());
                if let Err(err) = read_file_text(&file, on_text.clone()) {
                    on_text.emit(Err(format!("{err:?}")));
                }
            })
        };

        let on_species = {
            let species = species.clone();
            Callback::from(move |event: Event| {
                let select: HtmlSelectElement = event.target_unchecked_into();
                if let Some(value) = Species::parse(&select.value()) {
                    species.set(value);
                }
            })
        };

        let on_cancel = {
            let parsed = parsed.clone();
            let patient = patient.clone();
            let status = status.clone();
            Callback::from(move |_: MouseEvent| {
                parsed.set(None);
                patient.set(PatientData::default());
                status.set(IDLE_STATUS.to_string());
            })
        };

        let on_submit = {
            let parsed = parsed.clone();
            let patient = patient.clone();
            let species = species.clone();
            let status = status.clone();
            let on_generated = props.on_generated.clone();
            Callback::from(move |event: SubmitEvent| {
                event.prevent_default();
                let Some(csv) = (*parsed).clone() else {
                    return;
                };
                let report = csv.into_report(&patient, *species);
                parsed.set(None);
                patient.set(PatientData::default());
                status.set(IDLE_STATUS.to_string());
                on_generated.emit(report);
            })
        };

        let loading = *is_loading;

        html! {
            <section class="report-card no-print">
                <h2>{"Tạo báo cáo huyết học"}</h2>
                <p class="upload-status">{ (*status).clone() }</p>
                <button type="button" class="upload-button" onclick={on_pick} disabled={loading}>
                    { if loading { "Đang xử lý..." } else { "Chọn tệp CSV" } }
                </button>
                <input
                    ref={file_input}
                    class="visually-hidden"
                    type="file"
                    accept=".csv,text/csv"
                    onchange={on_file}
                    disabled={loading}
                />
                {
                    if parsed.is_some() {
                        html! {
                            <form class="patient-form" onsubmit={on_submit}>
                                { text_field("Mã mẫu", &patient, |p| &p.id, |p, v| p.id = v) }
                                { text_field("Chủ nuôi", &patient, |p| &p.owner_name, |p, v| p.owner_name = v) }
                                { text_field("Tên thú", &patient, |p| &p.pet_name, |p, v| p.pet_name = v) }
                                { text_field("Địa chỉ", &patient, |p| &p.address, |p, v| p.address = v) }
                                <label>
                                    {"Loài"}
                                    <select onchange={on_species}>
                                        { species_option(Species::Canine, *species) }
                                        { species_option(Species::Feline, *species) }
                                    </select>
                                </label>
                                { text_field("Giống", &patient, |p| &p.race, |p, v| p.race = v) }
                                { text_field("Tuổi", &patient, |p| &p.age, |p, v| p.age = v) }
                                { text_field("Giới tính", &patient, |p| &p.sex, |p, v| p.sex = v) }
                                { text_field("Bác sĩ chỉ định", &patient, |p| &p.vet, |p, v| p.vet = v) }
                                { text_field("Ngày", &patient, |p| &p.date, |p, v| p.date = v) }
                                <div class="form-actions">
                                    <button type="button" class="is-secondary" onclick={on_cancel}>{"Hủy"}</button>
                                    <button type="submit">{"Tạo báo cáo"}</button>
                                </div>
                            </form>
                        }
                    } else {
                        Html::default()
                    }
                }
            </section>
        }
    }

    fn text_field(
        label: &'static str,
        patient: &UseStateHandle<PatientData>,
        get: fn(&PatientData) -> &String,
        set: fn(&mut PatientData, String),
    ) -> Html {
        let oninput = {
            let patient = patient.clone();
            Callback::from(move |event: InputEvent| {
                let input: HtmlInputElement = event.target_unchecked_into();
                let mut next = (*patient).clone();
                set(&mut next, input.value());
                patient.set(next);
            })
        };

        html! {
            <label>
                { label }
                <input type="text" value={get(patient).clone()} oninput={oninput} />
            </label>
        }
    }

    fn species_option(option: Species, selected: Species) -> Html {
        let value = match option {
            Species::Canine => "canine",
            Species::Feline => "feline",
        };
        html! {
            <option value={value} selected={option == selected}>{ option.label() }</option>
        }
    }

    fn read_file_text(file: &File, on_done: Callback<Result<String, String>>) -> Result<(), JsValue> {
        let reader = FileReader::new()?;

        let onload = {
            let reader = reader.clone();
            let on_done = on_done.clone();
            Closure::<dyn FnMut(ProgressEvent)>::new(move |_event: ProgressEvent| {
                let text = reader
                    .result()
                    .ok()
                    .and_then(|value| value.as_string())
                    .ok_or_else(|| "Tệp không chứa văn bản".to_string());
                on_done.emit(text);
            })
        };
        let onerror = Closure::<dyn FnMut(ProgressEvent)>::new(move |_event: ProgressEvent| {
            on_done.emit(Err("FileReader thất bại".to_string()));
        });

        reader.set_onload(Some(onload.as_ref().unchecked_ref()));
        reader.set_onerror(Some(onerror.as_ref().unchecked_ref()));
        reader.read_as_text(file)?;

        // Mỗi lần đọc chỉ gọi lại một lần; trình duyệt giữ reader tới khi xong.
        onload.forget();
        onerror.forget();
        Ok(())
    }

    #[derive(Properties, PartialEq)]
    struct ReportViewProps {
        report: ReportData,
        config: ReportConfig,
        on_reset: Callback<()>,
    }

    #[function_component(ReportView)]
    fn report_view(props: &ReportViewProps) -> Html {
        let report = &props.report;
        let layout = ReportLayout::from_results(&report.results, props.config.two_column_threshold);
        let clinic_name = clinic_line(&props.config.clinic_name);
        let clinic_footer = clinic_line(&props.config.clinic_footer);
        let printed_at = Local::now().format("%d/%m/%Y %H:%M").to_string();

        let on_print = Callback::from(|_: MouseEvent| {
            if let Some(window) = web_sys::window() {
                if let Err(err) = window.print() {
                    console::error_1(&err);
                }
            }
        });

        let on_reset = {
            let on_reset = props.on_reset.clone();
            Callback::from(move |_: MouseEvent| on_reset.emit(()))
        };

        html! {
            <>
                <div class="report-actions no-print">
                    <button type="button" onclick={on_print}>{"In hoặc lưu PDF"}</button>
                    <button type="button" class="is-secondary" onclick={on_reset}>{"Tạo báo cáo mới"}</button>
                </div>
                <article class="report-card">
                    if let Some(name) = clinic_name {
                        <p class="report-clinic">{ name }</p>
                    }
                    <header class="report-header">
                        <h2>{"Phiếu kết quả huyết học"}</h2>
                        <span class="report-printed-at">{ format!("In lúc {printed_at}") }</span>
                    </header>
                    <h3>{"Thông tin bệnh nhân"}</h3>
                    <div class="patient-grid">
                        {
                            for patient_fields(&report.patient).into_iter().map(|(label, value)| html! {
                                <div><strong>{ format!("{label}: ") }</strong>{ value }</div>
                            })
                        }
                    </div>
                    <p><strong>{"Bác sĩ chỉ định: "}</strong>{ display_or_placeholder(&report.patient.vet) }</p>
                    <h3>{"Kết quả"}</h3>
                    <div class={classes!("result-columns", layout.is_two_column().then_some("is-two-column"))}>
                        { for layout.columns.iter().map(|rows| render_result_table(rows)) }
                    </div>
                    <p class="report-disclaimer">
                        {"Khoảng tham chiếu cần được bác sĩ thú y diễn giải."}
                    </p>
                    if let Some(footer) = clinic_footer {
                        <footer class="report-footer">{ footer }</footer>
                    }
                </article>
            </>
        }
    }

    fn render_result_table(rows: &[ResultRow]) -> Html {
        html! {
            <table class="result-table">
                <thead>
                    <tr>
                        <th>{"Chỉ số"}</th>
                        <th>{"Kết quả"}</th>
                        <th>{"Cờ"}</th>
                        <th>{"Tham chiếu"}</th>
                        <th>{"Đơn vị"}</th>
                    </tr>
                </thead>
                <tbody>
                    { for rows.iter().map(render_result_row) }
                </tbody>
            </table>
        }
    }

    fn render_result_row(row: &ResultRow) -> Html {
        html! {
            <tr class={row_class(row)}>
                <td>{ row.parameter.clone() }</td>
                <td class="result-value">{ row.result.clone() }</td>
                <td class="result-indicator">{ row.indicator.symbol() }</td>
                <td class="result-range">{ row.range.clone() }</td>
                <td>{ row.unit.clone() }</td>
            </tr>
        }
    }

    #[derive(Properties, PartialEq)]
    struct HistoryListProps {
        entries: Vec<ReportData>,
        on_select: Callback<ReportData>,
        on_delete: Callback<String>,
    }

    #[function_component(HistoryList)]
    fn history_list(props: &HistoryListProps) -> Html {
        if props.entries.is_empty() {
            return html! { <p class="history-empty">{"Chưa có báo cáo nào được lưu."}</p> };
        }

        html! {
            <ul class="history-list">
                {
                    for props.entries.iter().map(|report| {
                        let on_open = {
                            let on_select = props.on_select.clone();
                            let report = report.clone();
                            Callback::from(move |_: MouseEvent| on_select.emit(report.clone()))
                        };
                        let on_remove = {
                            let on_delete = props.on_delete.clone();
                            let id = report.patient.id.clone();
                            Callback::from(move |event: MouseEvent| {
                                event.stop_propagation();
                                on_delete.emit(id.clone());
                            })
                        };

                        html! {
                            <li class="history-item" key={report.patient.id.clone()}>
                                <button type="button" class="history-open" onclick={on_open}>
                                    <span>{ history_title(report) }</span>
                                    <span class="history-subtitle">{ history_subtitle(report) }</span>
                                </button>
                                <button type="button" class="is-secondary" onclick={on_remove} aria-label="Xóa báo cáo">
                                    {"Xóa"}
                                </button>
                            </li>
                        }
                    })
                }
            </ul>
        }
    }

    fn set_document_title(title: &str) {
        if let Some(document) = web_sys::window().and_then(|window| window.document()) {
            document.set_title(title);
        }
    }

    #[wasm_bindgen]
    pub fn mount_report_app(selector: &str, config: Option<JsValue>) -> Result<(), JsValue> {
        console_error_panic_hook::set_once();

        let window: Window =
            web_sys::window().ok_or_else(|| JsValue::from_str("Không có window"))?;
        let document: Document = window
            .document()
            .ok_or_else(|| JsValue::from_str("Không truy cập được document"))?;

        let target: Element = document
            .query_selector(selector)
            .map_err(|err| JsValue::from_str(&format!("Selector lỗi: {err:?}")))?
            .ok_or_else(|| JsValue::from_str("Không tìm thấy element theo selector"))?;

        let config: ReportConfig = match config {
            Some(value) if !value.is_undefined() && !value.is_null() => from_value(value)?,
            _ => ReportConfig::default(),
        };

        yew::Renderer::<ReportApp>::with_root_and_props(target, ReportAppProps { config })
            .render();
        Ok(())
    }
}

#[cfg(target_arch = "wasm32")]
pub use wasm_ui::mount_report_app;

#[cfg(not(target_arch = "wasm32"))]
pub fn mount_report_app(
    _: &str,
    _: Option<wasm_bindgen::JsValue>,
) -> Result<(), wasm_bindgen::JsValue> {
    Err(wasm_bindgen::JsValue::from_str(
        "vetreport-ui chỉ hỗ trợ biên dịch target wasm32",
    ))
}
