//! SOAP wire format: request envelopes and response shapes.
//!
//! Requests are small enough to format by hand; responses are deserialized
//! with quick-xml. Element names follow the Vitodata service, which speaks
//! German on the wire (`Ergebnis` = result code, `Wert` = value, ...).

use serde::de::DeserializeOwned;
use serde::Deserialize;

/// XML namespace of the Vitodata web service, also the `SOAPAction` prefix.
pub(crate) const SOAP_NAMESPACE: &str = "http://www.e-controlnet.de/services/vii/";

/// Production endpoint of the Vitodata web service.
pub const DEFAULT_ENDPOINT: &str =
    "https://www.viessmann.com/app_vitodata/VIIWebService-1.16.0.0/iPhoneWebService.asmx";

/// `SOAPAction` header value for an action.
pub(crate) fn soap_action(action: &str) -> String {
    format!("{SOAP_NAMESPACE}{action}")
}

/// Wrap an action body in the SOAP request envelope.
pub(crate) fn request_envelope(body: &str) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
         <soap:Envelope \
         xmlns:xsi=\"http://www.w3.org/2001/XMLSchema-instance\" \
         xmlns:xsd=\"http://www.w3.org/2001/XMLSchema\" \
         xmlns:soap=\"http://schemas.xmlsoap.org/soap/envelope/\" \
         xmlns=\"{SOAP_NAMESPACE}\">\n\
         <soap:Body>\n{body}\n</soap:Body>\n</soap:Envelope>"
    )
}

/// Escape text for inclusion in a request body.
pub(crate) fn xml_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// Response envelope. quick-xml keeps namespace prefixes, so the body
/// element arrives as `soap:Body`; the alias also accepts a bare `Body`.
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<B> {
    #[serde(rename = "soap:Body", alias = "Body")]
    pub body: B,
}

/// Result header common to every action response.
pub(crate) trait ResultHeader {
    fn code(&self) -> i32;
    fn message(&self) -> &str;
}

/// Deserializable response body, unwrapping to its result payload.
pub(crate) trait SoapBody: DeserializeOwned {
    type Output: ResultHeader;

    fn into_result(self) -> Self::Output;
}

macro_rules! result_header {
    ($($ty:ty),+ $(,)?) => {$(
        impl ResultHeader for $ty {
            fn code(&self) -> i32 {
                self.code
            }

            fn message(&self) -> &str {
                &self.message
            }
        }
    )+};
}

macro_rules! soap_body {
    ($($body:ty => $result:ty),+ $(,)?) => {$(
        impl SoapBody for $body {
            type Output = $result;

            fn into_result(self) -> $result {
                self.response.result
            }
        }
    )+};
}

#[derive(Debug, Deserialize)]
pub(crate) struct LoginBody {
    #[serde(rename = "LoginResponse")]
    pub response: LoginResponse,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LoginResponse {
    #[serde(rename = "LoginResult")]
    pub result: LoginResult,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LoginResult {
    #[serde(rename = "Ergebnis", default)]
    pub code: i32,
    #[serde(rename = "ErgebnisText", default)]
    pub message: String,
    #[serde(rename = "TechVersion", default)]
    pub tech_version: String,
    #[serde(rename = "Vorname", default)]
    pub firstname: String,
    #[serde(rename = "Nachname", default)]
    pub lastname: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GetDevicesBody {
    #[serde(rename = "GetDevicesResponse")]
    pub response: GetDevicesResponse,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GetDevicesResponse {
    #[serde(rename = "GetDevicesResult")]
    pub result: GetDevicesResult,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GetDevicesResult {
    #[serde(rename = "Ergebnis", default)]
    pub code: i32,
    #[serde(rename = "ErgebnisText", default)]
    pub message: String,
    #[serde(rename = "AnlageListe", default)]
    pub locations: LocationList,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct LocationList {
    #[serde(rename = "AnlageV2", default)]
    pub locations: Vec<LocationItem>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LocationItem {
    #[serde(rename = "AnlageId")]
    pub id: u32,
    #[serde(rename = "AnlageName", default)]
    pub name: String,
    #[serde(rename = "GeraeteListe", default)]
    pub devices: DeviceList,
    #[serde(rename = "HatFehler", default)]
    pub has_error: bool,
    #[serde(rename = "IstVerbunden", default)]
    pub is_connected: bool,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct DeviceList {
    #[serde(rename = "GeraetV2", default)]
    pub devices: Vec<DeviceItem>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DeviceItem {
    #[serde(rename = "GeraetId")]
    pub id: u32,
    #[serde(rename = "GeraetName", default)]
    pub name: String,
    #[serde(rename = "HatFehler", default)]
    pub has_error: bool,
    #[serde(rename = "IstVerbunden", default)]
    pub is_connected: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GetDataBody {
    #[serde(rename = "GetDataResponse")]
    pub response: GetDataResponse,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GetDataResponse {
    #[serde(rename = "GetDataResult")]
    pub result: GetDataResult,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GetDataResult {
    #[serde(rename = "Ergebnis", default)]
    pub code: i32,
    #[serde(rename = "ErgebnisText", default)]
    pub message: String,
    #[serde(rename = "DatenwerteListe", default)]
    pub values: ValueList,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ValueList {
    #[serde(rename = "WerteListe", default)]
    pub values: Vec<ValueItem>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ValueItem {
    #[serde(rename = "DatenpunktId")]
    pub id: u16,
    #[serde(rename = "Wert", default)]
    pub value: String,
    #[serde(rename = "Zeitstempel", default)]
    pub time: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WriteDataBody {
    #[serde(rename = "WriteDataResponse")]
    pub response: WriteDataResponse,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WriteDataResponse {
    #[serde(rename = "WriteDataResult")]
    pub result: WriteDataResult,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WriteDataResult {
    #[serde(rename = "Ergebnis", default)]
    pub code: i32,
    #[serde(rename = "ErgebnisText", default)]
    pub message: String,
    #[serde(rename = "AktualisierungsId", default)]
    pub refresh_id: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RefreshDataBody {
    #[serde(rename = "RefreshDataResponse")]
    pub response: RefreshDataResponse,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RefreshDataResponse {
    #[serde(rename = "RefreshDataResult")]
    pub result: RefreshDataResult,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RefreshDataResult {
    #[serde(rename = "Ergebnis", default)]
    pub code: i32,
    #[serde(rename = "ErgebnisText", default)]
    pub message: String,
    #[serde(rename = "AktualisierungsId", default)]
    pub refresh_id: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RequestWriteStatusBody {
    #[serde(rename = "RequestWriteStatusResponse")]
    pub response: RequestWriteStatusResponse,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RequestWriteStatusResponse {
    #[serde(rename = "RequestWriteStatusResult")]
    pub result: RequestStatusResult,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RequestRefreshStatusBody {
    #[serde(rename = "RequestRefreshStatusResponse")]
    pub response: RequestRefreshStatusResponse,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RequestRefreshStatusResponse {
    #[serde(rename = "RequestRefreshStatusResult")]
    pub result: RequestStatusResult,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RequestStatusResult {
    #[serde(rename = "Ergebnis", default)]
    pub code: i32,
    #[serde(rename = "ErgebnisText", default)]
    pub message: String,
    #[serde(rename = "Status", default)]
    pub status: i32,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GetErrorHistoryBody {
    #[serde(rename = "GetErrorHistoryResponse")]
    pub response: GetErrorHistoryResponse,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GetErrorHistoryResponse {
    #[serde(rename = "GetErrorHistoryResult")]
    pub result: GetErrorHistoryResult,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GetErrorHistoryResult {
    #[serde(rename = "Ergebnis", default)]
    pub code: i32,
    #[serde(rename = "ErgebnisText", default)]
    pub message: String,
    #[serde(rename = "FehlerListe", default)]
    pub errors: ErrorList,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorList {
    #[serde(rename = "FehlerHistorie", default)]
    pub errors: Vec<ErrorItem>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorItem {
    #[serde(rename = "FehlerCode", default)]
    pub error: String,
    #[serde(rename = "FehlerMeldung", default)]
    pub message: String,
    #[serde(rename = "Zeitstempel", default)]
    pub time: String,
    #[serde(rename = "FehlerIstAktiv", default)]
    pub is_active: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GetTimesheetDataBody {
    #[serde(rename = "GetTimesheetDataResponse")]
    pub response: GetTimesheetDataResponse,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GetTimesheetDataResponse {
    #[serde(rename = "GetTimesheetDataResult")]
    pub result: GetTimesheetDataResult,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GetTimesheetDataResult {
    #[serde(rename = "Ergebnis", default)]
    pub code: i32,
    #[serde(rename = "ErgebnisText", default)]
    pub message: String,
    #[serde(rename = "SchaltsatzDaten", default)]
    pub timesheet: TimesheetData,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct TimesheetData {
    #[serde(rename = "DatenpunktID", default)]
    pub id: u16,
    #[serde(rename = "Schaltzeiten", default)]
    pub slots: TimeslotList,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct TimeslotList {
    #[serde(rename = "Schaltzeit", default)]
    pub slots: Vec<TimeslotItem>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TimeslotItem {
    #[serde(rename = "Wochentag", default)]
    pub day: String,
    #[serde(rename = "ZeitVon")]
    pub from: u16,
    #[serde(rename = "ZeitBis")]
    pub to: u16,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WriteTimesheetDataBody {
    #[serde(rename = "WriteTimesheetDataResponse")]
    pub response: WriteTimesheetDataResponse,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WriteTimesheetDataResponse {
    #[serde(rename = "WriteTimesheetDataResult")]
    pub result: WriteTimesheetDataResult,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WriteTimesheetDataResult {
    #[serde(rename = "Ergebnis", default)]
    pub code: i32,
    #[serde(rename = "ErgebnisText", default)]
    pub message: String,
    #[serde(rename = "AktualisierungsId", default)]
    pub refresh_id: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GetTypeInfoBody {
    #[serde(rename = "GetTypeInfoResponse")]
    pub response: GetTypeInfoResponse,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GetTypeInfoResponse {
    #[serde(rename = "GetTypeInfoResult")]
    pub result: GetTypeInfoResult,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GetTypeInfoResult {
    #[serde(rename = "Ergebnis", default)]
    pub code: i32,
    #[serde(rename = "ErgebnisText", default)]
    pub message: String,
    #[serde(rename = "TypeInfoListe", default)]
    pub infos: TypeInfoList,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct TypeInfoList {
    #[serde(rename = "DatenpunktTypInfo", default)]
    pub infos: Vec<TypeInfoItem>,
}

/// One `GetTypeInfo` row. `DatenpunktId` stays a string: enum labels are
/// reported as extra rows keyed `<parentId>-<index>`.
#[derive(Debug, Deserialize)]
pub(crate) struct TypeInfoItem {
    #[serde(rename = "DatenpunktId", default)]
    pub id: String,
    #[serde(rename = "DatenpunktName", default)]
    pub name: String,
    #[serde(rename = "DatenpunktTyp", default)]
    pub attr_type: String,
    #[serde(rename = "DatenpunktTypWert", default)]
    pub type_value: u32,
    #[serde(rename = "MinimalWert", default)]
    pub min_value: String,
    #[serde(rename = "MaximalWert", default)]
    pub max_value: String,
    #[serde(rename = "DatenpunktGruppe", default)]
    pub group: String,
    #[serde(rename = "HeizkreisId", default)]
    pub circuit_id: u32,
    #[serde(rename = "Auslieferungswert", default)]
    pub default_value: String,
    #[serde(rename = "IstLesbar", default)]
    pub readable: bool,
    #[serde(rename = "IstSchreibbar", default)]
    pub writable: bool,
}

result_header!(
    LoginResult,
    GetDevicesResult,
    GetDataResult,
    WriteDataResult,
    RefreshDataResult,
    RequestStatusResult,
    GetErrorHistoryResult,
    GetTimesheetDataResult,
    WriteTimesheetDataResult,
    GetTypeInfoResult,
);

soap_body!(
    LoginBody => LoginResult,
    GetDevicesBody => GetDevicesResult,
    GetDataBody => GetDataResult,
    WriteDataBody => WriteDataResult,
    RefreshDataBody => RefreshDataResult,
    RequestWriteStatusBody => RequestStatusResult,
    RequestRefreshStatusBody => RequestStatusResult,
    GetErrorHistoryBody => GetErrorHistoryResult,
    GetTimesheetDataBody => GetTimesheetDataResult,
    WriteTimesheetDataBody => WriteTimesheetDataResult,
    GetTypeInfoBody => GetTypeInfoResult,
);

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn wrap(payload: &str) -> String {
        format!(
            "<?xml version=\"1.0\" encoding=\"utf-8\"?>\
             <soap:Envelope xmlns:soap=\"http://schemas.xmlsoap.org/soap/envelope/\" \
             xmlns:xsi=\"http://www.w3.org/2001/XMLSchema-instance\" \
             xmlns:xsd=\"http://www.w3.org/2001/XMLSchema\">\
             <soap:Body>{payload}</soap:Body></soap:Envelope>"
        )
    }

    #[test]
    fn escape() {
        assert_eq!(xml_escape("a&b <c> \"d\" 'e'"), "a&amp;b &lt;c&gt; &quot;d&quot; &apos;e&apos;");
        assert_eq!(xml_escape("plain"), "plain");
    }

    #[test]
    fn request_envelope_shape() {
        let env = request_envelope("<Login>x</Login>");
        assert!(env.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(env.contains("xmlns=\"http://www.e-controlnet.de/services/vii/\""));
        assert!(env.contains("<soap:Body>\n<Login>x</Login>\n</soap:Body>"));
        assert!(env.ends_with("</soap:Envelope>"));
    }

    #[test]
    fn login_response() {
        let xml = wrap(
            "<LoginResponse xmlns=\"http://www.e-controlnet.de/services/vii/\">\
             <LoginResult>\
             <Ergebnis>0</Ergebnis><ErgebnisText>Kein Fehler</ErgebnisText>\
             <TechVersion>2.5.6.0</TechVersion>\
             <Vorname>Marcel</Vorname><Nachname>Pagnol</Nachname>\
             </LoginResult></LoginResponse>",
        );
        let env: Envelope<LoginBody> = quick_xml::de::from_str(&xml).unwrap();
        let result = env.body.response.result;
        assert_eq!(result.code, 0);
        assert_eq!(result.message, "Kein Fehler");
        assert_eq!(result.tech_version, "2.5.6.0");
        assert_eq!(result.firstname, "Marcel");
        assert_eq!(result.lastname, "Pagnol");
    }

    #[test]
    fn devices_response() {
        let xml = wrap(
            "<GetDevicesResponse xmlns=\"http://www.e-controlnet.de/services/vii/\">\
             <GetDevicesResult>\
             <Ergebnis>0</Ergebnis><ErgebnisText>Kein Fehler</ErgebnisText>\
             <AnlageListe><AnlageV2>\
             <AnlageId>31456</AnlageId><AnlageName>Maison</AnlageName>\
             <GeraeteListe><GeraetV2>\
             <GeraetId>40213</GeraetId><GeraetName>VT 200</GeraetName>\
             <HatFehler>false</HatFehler><IstVerbunden>true</IstVerbunden>\
             </GeraetV2></GeraeteListe>\
             <HatFehler>true</HatFehler><IstVerbunden>true</IstVerbunden>\
             </AnlageV2></AnlageListe>\
             </GetDevicesResult></GetDevicesResponse>",
        );
        let env: Envelope<GetDevicesBody> = quick_xml::de::from_str(&xml).unwrap();
        let result = env.body.response.result;
        assert_eq!(result.locations.locations.len(), 1);
        let location = &result.locations.locations[0];
        assert_eq!(location.id, 31456);
        assert!(location.has_error);
        let device = &location.devices.devices[0];
        assert_eq!(device.id, 40213);
        assert_eq!(device.name, "VT 200");
        assert!(!device.has_error);
        assert!(device.is_connected);
    }

    #[test]
    fn data_response_missing_lists_default() {
        let xml = wrap(
            "<GetDataResponse><GetDataResult>\
             <Ergebnis>4</Ergebnis><ErgebnisText>Sitzung ungültig</ErgebnisText>\
             </GetDataResult></GetDataResponse>",
        );
        let env: Envelope<GetDataBody> = quick_xml::de::from_str(&xml).unwrap();
        let result = env.body.response.result;
        assert_eq!(result.code, 4);
        assert_eq!(result.message, "Sitzung ungültig");
        assert!(result.values.values.is_empty());
    }

    #[test]
    fn timesheet_response() {
        let xml = wrap(
            "<GetTimesheetDataResponse><GetTimesheetDataResult>\
             <Ergebnis>0</Ergebnis>\
             <SchaltsatzDaten><DatenpunktID>7191</DatenpunktID>\
             <Schaltzeiten>\
             <Schaltzeit><Wochentag>MON</Wochentag><ZeitVon>620</ZeitVon><ZeitBis>2230</ZeitBis></Schaltzeit>\
             <Schaltzeit><Wochentag>SAT</Wochentag><ZeitVon>700</ZeitVon><ZeitBis>2300</ZeitBis></Schaltzeit>\
             </Schaltzeiten></SchaltsatzDaten>\
             </GetTimesheetDataResult></GetTimesheetDataResponse>",
        );
        let env: Envelope<GetTimesheetDataBody> = quick_xml::de::from_str(&xml).unwrap();
        let sheet = env.body.response.result.timesheet;
        assert_eq!(sheet.id, 7191);
        assert_eq!(sheet.slots.slots.len(), 2);
        assert_eq!(sheet.slots.slots[0].day, "MON");
        assert_eq!(sheet.slots.slots[0].from, 620);
        assert_eq!(sheet.slots.slots[1].to, 2300);
    }

    #[test]
    fn type_info_response() {
        let xml = wrap(
            "<GetTypeInfoResponse><GetTypeInfoResult>\
             <Ergebnis>0</Ergebnis>\
             <TypeInfoListe>\
             <DatenpunktTypInfo>\
             <DatenpunktId>92</DatenpunktId>\
             <DatenpunktName>konf_betriebsart_rw</DatenpunktName>\
             <DatenpunktTyp>ENUM</DatenpunktTyp>\
             <IstLesbar>true</IstLesbar><IstSchreibbar>true</IstSchreibbar>\
             </DatenpunktTypInfo>\
             <DatenpunktTypInfo>\
             <DatenpunktId>92-0</DatenpunktId>\
             <DatenpunktName>konf_betriebsart_rw</DatenpunktName>\
             <MinimalWert>ABSCHALT</MinimalWert>\
             </DatenpunktTypInfo>\
             </TypeInfoListe>\
             </GetTypeInfoResult></GetTypeInfoResponse>",
        );
        let env: Envelope<GetTypeInfoBody> = quick_xml::de::from_str(&xml).unwrap();
        let infos = env.body.response.result.infos.infos;
        assert_eq!(infos.len(), 2);
        assert_eq!(infos[0].id, "92");
        assert_eq!(infos[0].attr_type, "ENUM");
        assert!(infos[0].writable);
        assert_eq!(infos[1].id, "92-0");
        assert_eq!(infos[1].min_value, "ABSCHALT");
    }
}
